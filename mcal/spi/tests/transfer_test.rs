//! Lifecycle and transfer engine tests against the loopback peripheral

use std::sync::atomic::{AtomicUsize, Ordering};

use mcal_core::StdReturnType;
use mcal_spi::registers::{cr1, cr2, sr};
use mcal_spi::sim::{sim_clock, LoopbackSpi, SimClock, SIM_CLOCK_MASK};
use mcal_spi::{
    AsyncMode, BaudRatePrescaler, BitOrder, ClockPhase, ClockPolarity, DataSize, Direction,
    HwUnit, Role, SlaveSelect, SpiConfiguration, SpiDriver, SpiDriverConfig, SpiError, SpiStatus,
};

type SimSpi = SpiDriver<LoopbackSpi, SimClock>;

fn driver() -> SimSpi {
    SpiDriver::new(LoopbackSpi::new(), sim_clock(), SpiDriverConfig::default())
}

fn sim(spi: &SimSpi) -> &LoopbackSpi {
    spi.peripheral().regs()
}

fn hardware_operations(spi: &SimSpi) -> u32 {
    sim(spi).registers().operations() + spi.peripheral().clock().rcc().operations()
}

fn full_config() -> SpiConfiguration {
    SpiConfiguration {
        direction: Direction::FullDuplex,
        role: Role::Master,
        data_size: DataSize::Bits8,
        clock_polarity: ClockPolarity::IdleHigh,
        clock_phase: ClockPhase::SecondEdge,
        slave_select: SlaveSelect::Software,
        baud_rate_prescaler: BaudRatePrescaler::Div16,
        bit_order: BitOrder::MsbFirst,
        crc_polynomial: 0x1021,
    }
}

#[test]
fn test_init_programs_peripheral() {
    let mut spi = driver();
    assert_eq!(spi.driver_status(), SpiStatus::Uninit);
    assert!(!spi.peripheral().clock_enabled());

    let config = full_config();
    spi.init(&config);

    assert_eq!(sim(&spi).cr1(), config.cr1_bits() | cr1::SPE);
    assert_eq!(sim(&spi).crc_polynomial(), 0x1021);
    assert_eq!(sim(&spi).cr2() & cr2::ASYNC_MASK, 0);
    assert!(spi.peripheral().clock_enabled());
    assert_eq!(spi.active_config(), Some(&config));
    assert_eq!(spi.driver_status(), SpiStatus::Idle);
}

#[test]
fn test_init_replaces_previous_configuration() {
    let mut spi = driver();
    let first = SpiConfiguration::builder()
        .bit_order(BitOrder::LsbFirst)
        .baud_rate_prescaler(BaudRatePrescaler::Div256)
        .build();
    spi.init(&first);
    assert_ne!(sim(&spi).cr1() & cr1::LSBFIRST, 0);

    let second = SpiConfiguration::default();
    spi.init(&second);
    assert_eq!(sim(&spi).cr1(), second.cr1_bits() | cr1::SPE);
    assert_eq!(spi.active_config(), Some(&second));
}

#[test]
fn test_deinit_returns_to_unconfigured() {
    let mut spi = driver();
    spi.init(&full_config());
    spi.deinit();

    assert_eq!(sim(&spi).cr1(), 0);
    assert!(!spi.peripheral().clock_enabled());
    assert_eq!(spi.peripheral().clock().rcc().peek(0x24) & SIM_CLOCK_MASK, 0);
    assert_eq!(spi.driver_status(), SpiStatus::Uninit);
    assert_eq!(spi.write_immediate(0x55u8), Err(SpiError::Uninitialized));

    spi.init(&full_config());
    assert_eq!(spi.write_immediate(0x55u8), Ok(()));
}

#[test]
fn test_write_immediate_before_init_touches_nothing() {
    let mut spi = driver();
    assert_eq!(spi.write_immediate(1u8), Err(SpiError::Uninitialized));
    assert_eq!(hardware_operations(&spi), 0);
}

#[test]
fn test_write_immediate_waits_for_transmit_buffer() {
    let mut spi = driver();
    spi.init(&SpiConfiguration::default());
    sim(&spi).stall_tx(5);

    assert_eq!(spi.write_immediate(0x5Au8), Ok(()));
    assert_eq!(sim(&spi).transmitted(), &[0x5A]);
}

#[test]
fn test_write_immediate_rejects_wrong_width() {
    let mut spi = driver();
    spi.init(&SpiConfiguration::default());
    assert_eq!(spi.write_immediate(0x1234u16), Err(SpiError::InvalidArgument));
    assert_eq!(sim(&spi).units_sent(), 0);
}

#[test]
fn test_exchange_echoes_loopback() {
    let mut spi = driver();
    let config = full_config();
    spi.init(&config);

    let mut dst = [0u8; 3];
    assert_eq!(spi.buffered_exchange(&config, &[1, 2, 3], &mut dst, 3), Ok(()));
    assert_eq!(dst, [1, 2, 3]);
}

#[test]
fn test_exchange_zero_length_touches_nothing() {
    let mut spi = driver();
    let mut dst = [0xEEu8; 2];

    assert_eq!(
        spi.buffered_exchange(&full_config(), &[1, 2], &mut dst, 0),
        Ok(())
    );
    assert_eq!(hardware_operations(&spi), 0);
    assert_eq!(dst, [0xEE, 0xEE]);
    assert_eq!(spi.active_config(), None);
}

#[test]
fn test_exchange_writes_exactly_length_units() {
    let mut spi = driver();
    let config = SpiConfiguration::default();
    let mut dst = [0xEEu8; 6];

    assert_eq!(
        spi.buffered_exchange(&config, &[10, 20, 30, 40], &mut dst, 3),
        Ok(())
    );
    assert_eq!(dst, [10, 20, 30, 0xEE, 0xEE, 0xEE]);
    assert_eq!(sim(&spi).units_sent(), 3);
}

#[test]
fn test_exchange_reapplies_configuration() {
    let mut spi = driver();
    spi.init(&SpiConfiguration::default());

    let lsb = SpiConfiguration::builder().bit_order(BitOrder::LsbFirst).build();
    let mut dst = [0u8; 1];
    spi.buffered_exchange(&lsb, &[9], &mut dst, 1).unwrap();

    assert_ne!(sim(&spi).cr1() & cr1::LSBFIRST, 0);
    assert_eq!(spi.active_config(), Some(&lsb));
}

#[test]
fn test_exchange_stores_received_not_transmitted() {
    let mut spi = driver();
    sim(&spi).respond_with(|unit| !unit);

    let mut dst = [0u8; 2];
    spi.buffered_exchange(&SpiConfiguration::default(), &[0x0F, 0xAA], &mut dst, 2)
        .unwrap();
    assert_eq!(dst, [0xF0, 0x55]);
    assert_eq!(sim(&spi).transmitted(), &[0x0F, 0xAA]);
}

#[test]
fn test_exchange_aborts_at_first_failure() {
    let mut spi = driver();
    sim(&spi).fail_after(2, sr::OVR);

    let mut dst = [0xEEu8; 3];
    assert_eq!(
        spi.buffered_exchange(&SpiConfiguration::default(), &[1, 2, 3], &mut dst, 3),
        Err(SpiError::Overrun)
    );
    assert_eq!(dst, [1, 0xEE, 0xEE]);
    assert_eq!(sim(&spi).units_sent(), 2);
}

#[test]
fn test_exchange_length_past_buffers() {
    let mut spi = driver();
    let mut dst = [0u8; 2];

    assert_eq!(
        spi.buffered_exchange(&SpiConfiguration::default(), &[1, 2, 3], &mut dst, 3),
        Err(SpiError::InvalidArgument)
    );
    assert_eq!(hardware_operations(&spi), 0);
}

#[test]
fn test_exchange_sixteen_bit_words() {
    let mut spi = driver();
    let wide = SpiConfiguration::builder().data_size(DataSize::Bits16).build();

    let mut dst = [0u16; 2];
    spi.buffered_exchange(&wide, &[0x1234, 0xBEEF], &mut dst, 2).unwrap();
    assert_eq!(dst, [0x1234, 0xBEEF]);
    assert_ne!(sim(&spi).cr1() & cr1::DFF, 0);

    let mut narrow = [0u8; 1];
    assert_eq!(
        spi.buffered_exchange(&wide, &[1u8], &mut narrow, 1),
        Err(SpiError::InvalidArgument)
    );
}

#[test]
fn test_job_result_follows_busy_flag() {
    let mut spi = driver();
    spi.init(&SpiConfiguration::default());
    assert_eq!(spi.job_result(), StdReturnType::Ok);

    sim(&spi).set_busy(true);
    assert_eq!(spi.job_result(), StdReturnType::NotOk);
    assert_eq!(spi.status(), StdReturnType::NotOk);
    assert_eq!(spi.driver_status(), SpiStatus::Busy);

    sim(&spi).set_busy(false);
    assert_eq!(spi.job_result(), StdReturnType::Ok);
    assert_eq!(spi.status(), StdReturnType::Ok);
    assert_eq!(spi.driver_status(), SpiStatus::Idle);
}

#[test]
fn test_job_result_has_no_side_effects() {
    let spi = driver();
    sim(&spi).set_busy(true);
    for _ in 0..3 {
        assert_eq!(spi.job_result(), StdReturnType::NotOk);
    }
    assert_eq!(sim(&spi).registers().writes(), 0);
}

static INTERRUPT_IDLE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_interrupt_idle() {
    INTERRUPT_IDLE_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_interrupt_mode_runs_idle_hook() {
    let config = SpiDriverConfig::builder()
        .async_mode(AsyncMode::Interrupt)
        .idle_hook(count_interrupt_idle)
        .build();
    let mut spi = SpiDriver::new(LoopbackSpi::new(), sim_clock(), config);
    spi.init(&SpiConfiguration::default());
    assert_eq!(sim(&spi).cr2() & cr2::ASYNC_MASK, cr2::TXEIE | cr2::RXNEIE);

    sim(&spi).stall_tx(4);
    spi.write_immediate(0x11u8).unwrap();
    assert_eq!(INTERRUPT_IDLE_CALLS.load(Ordering::SeqCst), 4);
}

static POLLING_IDLE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_polling_idle() {
    POLLING_IDLE_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_polling_mode_spins_without_hook() {
    let config = SpiDriverConfig::builder()
        .idle_hook(count_polling_idle)
        .build();
    let mut spi = SpiDriver::new(LoopbackSpi::new(), sim_clock(), config);
    spi.init(&SpiConfiguration::default());

    sim(&spi).stall_tx(4);
    spi.write_immediate(0x11u8).unwrap();
    assert_eq!(POLLING_IDLE_CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn test_async_mode_reprograms_own_unit() {
    let mut spi = driver();
    spi.init(&SpiConfiguration::default());

    spi.set_async_mode(HwUnit::UNIT0, AsyncMode::Dma);
    assert_eq!(sim(&spi).cr2() & cr2::ASYNC_MASK, cr2::TXDMAEN | cr2::RXDMAEN);

    spi.set_async_mode(HwUnit::UNIT2, AsyncMode::Interrupt);
    assert_eq!(sim(&spi).cr2() & cr2::ASYNC_MASK, cr2::TXDMAEN | cr2::RXDMAEN);
    assert_eq!(spi.async_mode(HwUnit::UNIT2), AsyncMode::Interrupt);
    assert_eq!(spi.async_mode(HwUnit::UNIT1), AsyncMode::Polling);
}

#[test]
fn test_async_mode_before_init_is_recorded_only() {
    let mut spi = driver();
    spi.set_async_mode(HwUnit::UNIT0, AsyncMode::Interrupt);
    assert_eq!(hardware_operations(&spi), 0);

    spi.init(&SpiConfiguration::default());
    assert_eq!(sim(&spi).cr2() & cr2::ASYNC_MASK, cr2::TXEIE | cr2::RXNEIE);
}

#[test]
fn test_driver_config_builder() {
    let config = SpiDriverConfig::builder()
        .hw_unit(HwUnit::UNIT1)
        .async_mode(AsyncMode::Dma)
        .build();
    let spi = SpiDriver::new(LoopbackSpi::new(), sim_clock(), config);

    assert_eq!(spi.hw_unit(), HwUnit::UNIT1);
    assert_eq!(spi.async_mode(HwUnit::UNIT1), AsyncMode::Dma);
    assert_eq!(spi.async_mode(HwUnit::UNIT0), AsyncMode::Polling);
}
