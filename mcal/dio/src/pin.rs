//! `embedded-hal` digital pin view of a DIO channel

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use mcal_core::RegisterAccess;

use crate::channel::{ChannelId, GpioRegister, Level};
use crate::driver::Dio;

/// One DIO channel borrowed from the service
pub struct DioPin<'a, P> {
    dio: &'a mut Dio<P>,
    channel: ChannelId,
}

impl<'a, P: RegisterAccess<GpioRegister>> DioPin<'a, P> {
    pub(crate) fn new(dio: &'a mut Dio<P>, channel: ChannelId) -> Self {
        Self { dio, channel }
    }

    /// Channel this pin drives
    pub fn id(&self) -> ChannelId {
        self.channel
    }

    /// Output latch level, as opposed to the sampled input level
    fn output_level(&self) -> Level {
        let odr = self
            .dio
            .port(self.channel.port())
            .read_register(GpioRegister::Odr);
        Level::from_bit(odr & u32::from(self.channel.mask()) != 0)
    }
}

impl<P> ErrorType for DioPin<'_, P> {
    type Error = Infallible;
}

impl<P: RegisterAccess<GpioRegister>> InputPin for DioPin<'_, P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.dio.read_channel(self.channel).is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.dio.read_channel(self.channel).is_high())
    }
}

impl<P: RegisterAccess<GpioRegister>> OutputPin for DioPin<'_, P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.dio.write_channel(self.channel, Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.dio.write_channel(self.channel, Level::High);
        Ok(())
    }
}

impl<P: RegisterAccess<GpioRegister>> StatefulOutputPin for DioPin<'_, P> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.output_level().is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.output_level().is_high())
    }
}
