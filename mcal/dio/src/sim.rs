//! Loopback GPIO port for host tests
//!
//! Output writes (ODR or BSRR) are reflected on the input register, as if
//! every pin were wired back to itself. An external level can be forced onto
//! the inputs with [`LoopbackPort::drive_inputs`].

use mcal_core::sim::RegisterFile;
use mcal_core::{Register, RegisterAccess};

use crate::channel::GpioRegister;

/// Simulated GPIO port with inputs looped back from outputs
#[derive(Debug, Default)]
pub struct LoopbackPort {
    regs: RegisterFile<8>,
    last_bsrr: u32,
}

impl LoopbackPort {
    pub const fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            last_bsrr: 0,
        }
    }

    /// Output data register
    pub fn output(&self) -> u16 {
        self.regs.peek(GpioRegister::Odr.offset()) as u16
    }

    /// Input data register
    pub fn input(&self) -> u16 {
        self.regs.peek(GpioRegister::Idr.offset()) as u16
    }

    /// Force the input register, as an external driver would
    pub fn drive_inputs(&mut self, value: u16) {
        self.regs.poke(GpioRegister::Idr.offset(), u32::from(value));
    }

    /// Last value written to the set/reset register
    pub fn last_bsrr(&self) -> u32 {
        self.last_bsrr
    }

    /// Register accesses made through the shim
    pub fn registers(&self) -> &RegisterFile<8> {
        &self.regs
    }

    fn latch_output(&mut self, odr: u32) {
        let odr = odr & 0xFFFF;
        self.regs.write_register(GpioRegister::Odr, odr);
        self.regs.poke(GpioRegister::Idr.offset(), odr);
    }
}

impl RegisterAccess<GpioRegister> for LoopbackPort {
    fn read_register(&self, reg: GpioRegister) -> u32 {
        match reg {
            // write-only
            GpioRegister::Bsrr => 0,
            _ => self.regs.read_register(reg),
        }
    }

    fn write_register(&mut self, reg: GpioRegister, value: u32) {
        match reg {
            GpioRegister::Bsrr => {
                self.last_bsrr = value;
                let set = value & 0xFFFF;
                let reset = value >> 16;
                // set wins when both halves name the same bit
                let odr = (u32::from(self.output()) & !reset) | set;
                self.latch_output(odr);
            }
            GpioRegister::Odr => self.latch_output(value),
            // read-only
            GpioRegister::Idr => {}
            GpioRegister::Moder => self.regs.write_register(reg, value),
        }
    }
}
