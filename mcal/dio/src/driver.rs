//! DIO service
//!
//! Stateless mapping from channels, channel groups and ports onto GPIO port
//! registers. Every call goes straight to the registers; nothing is cached.

use mcal_core::RegisterAccess;

use crate::channel::{ChannelGroup, ChannelId, GpioRegister, Level, PortId, NUM_OF_DIO_PORTS};
use crate::pin::DioPin;

/// DIO service over two GPIO ports
pub struct Dio<P> {
    ports: [P; NUM_OF_DIO_PORTS],
}

impl<P: RegisterAccess<GpioRegister>> Dio<P> {
    /// Create the service from the register blocks of port A and port B
    pub fn new(port_a: P, port_b: P) -> Self {
        Self {
            ports: [port_a, port_b],
        }
    }

    /// Release the port register blocks
    pub fn release(self) -> [P; NUM_OF_DIO_PORTS] {
        self.ports
    }

    /// Access one port's register block
    pub fn port(&self, port: PortId) -> &P {
        &self.ports[port.index()]
    }

    fn port_mut(&mut self, port: PortId) -> &mut P {
        &mut self.ports[port.index()]
    }

    /// Read the input level of one channel
    pub fn read_channel(&self, channel: ChannelId) -> Level {
        let idr = self.port(channel.port()).read_register(GpioRegister::Idr);
        Level::from_bit(idr & u32::from(channel.mask()) != 0)
    }

    /// Drive one channel through the set/reset register
    pub fn write_channel(&mut self, channel: ChannelId, level: Level) {
        let bit = u32::from(channel.bit());
        let bsrr = match level {
            Level::High => 1 << bit,
            Level::Low => 1 << (bit + 16),
        };
        log::trace!("dio: {} <- {}", channel.raw(), level.is_high());
        self.port_mut(channel.port())
            .write_register(GpioRegister::Bsrr, bsrr);
    }

    /// Read the input bits of a channel group
    pub fn read_channel_group(&self, group: &ChannelGroup) -> u16 {
        let idr = self.port(group.port).read_register(GpioRegister::Idr);
        (idr as u16) & group.mask
    }

    /// Write the masked bits of `level` to a channel group, leaving the rest
    /// of the port untouched
    pub fn write_channel_group(&mut self, group: &ChannelGroup, level: u16) {
        self.masked_write_port(group.port, level, group.mask);
    }

    /// Toggle one channel and return its new level.
    ///
    /// Read-then-write; a concurrent writer between the two steps is lost.
    pub fn flip_channel(&mut self, channel: ChannelId) -> Level {
        let level = !self.read_channel(channel);
        self.write_channel(channel, level);
        level
    }

    /// Write the bits of `level` selected by `mask` to the output register of
    /// `port`
    pub fn masked_write_port(&mut self, port: PortId, level: u16, mask: u16) {
        log::trace!("dio: port {} mask {:#06x} <- {:#06x}", port.index(), mask, level);
        self.port_mut(port)
            .modify(GpioRegister::Odr, u32::from(mask), u32::from(level));
    }

    /// Borrow one channel as an `embedded-hal` pin
    pub fn channel(&mut self, channel: ChannelId) -> DioPin<'_, P> {
        DioPin::new(self, channel)
    }
}
