//! Control and maintenance commands
//!
//! These talk to the instrument directly, outside any batch window.

use tracing::info;

use el406_core::constants::{END_OF_BATCH_TIMEOUT, HOMING_TIMEOUT, LONG_READ_TIMEOUT};
use el406_core::{Command, Frame};
use el406_types::{Motor, MotorHomeType, StepType, WasherManifold};

use crate::device::El406;
use crate::error::Result;

impl El406 {
    /// Abort the running operation
    ///
    /// With a step type, only steps of that kind are aborted.
    pub async fn abort(&mut self, step_type: Option<StepType>) -> Result<()> {
        match step_type {
            Some(step) => info!("Aborting {:?} steps", step),
            None => info!("Aborting current operation"),
        }

        let selector = step_type.map_or(0, StepType::wire_byte);
        self.exchange(
            &Frame::with_data(Command::Abort, vec![selector]),
            self.timeout(),
        )
        .await?;
        Ok(())
    }

    /// Pause the running operation
    pub async fn pause(&mut self) -> Result<()> {
        info!("Pausing operation");
        self.exchange(&Frame::new(Command::Pause), self.timeout())
            .await?;
        Ok(())
    }

    /// Resume a paused operation
    pub async fn resume(&mut self) -> Result<()> {
        info!("Resuming operation");
        self.exchange(&Frame::new(Command::Resume), self.timeout())
            .await?;
        Ok(())
    }

    /// Reset the instrument to a known state
    pub async fn reset(&mut self) -> Result<()> {
        info!("Resetting instrument...");
        self.exchange(&Frame::new(Command::Reset), LONG_READ_TIMEOUT)
            .await?;
        info!("Instrument reset complete");
        Ok(())
    }

    /// Send the end-of-batch marker
    ///
    /// This only marks the batch as finished; it does not stop pumps or
    /// home any motors.
    pub async fn end_of_batch(&mut self) -> Result<()> {
        self.exchange(&Frame::new(Command::EndOfBatch), END_OF_BATCH_TIMEOUT)
            .await?;
        info!("End-of-batch marker sent");
        Ok(())
    }

    /// Home or verify motor positions
    ///
    /// `motor` selects a single motor for the per-motor home types and
    /// is ignored by the grouped ones.
    pub async fn home_motors(
        &mut self,
        home_type: MotorHomeType,
        motor: Option<Motor>,
    ) -> Result<()> {
        info!("Home/verify motors: {:?} ({:?})", home_type, motor);

        let motor_byte = motor.map_or(0, Motor::wire_byte);
        self.exchange(
            &Frame::with_data(Command::HomeMotors, vec![home_type.wire_byte(), motor_byte]),
            HOMING_TIMEOUT,
        )
        .await?;

        info!("Motors homed");
        Ok(())
    }

    /// Set the installed washer manifold type
    pub async fn set_washer_manifold(&mut self, manifold: WasherManifold) -> Result<()> {
        info!("Setting washer manifold to {:?}", manifold);
        self.exchange(
            &Frame::with_data(Command::SetWasherManifold, vec![manifold.wire_byte()]),
            self.timeout(),
        )
        .await?;
        Ok(())
    }

    /// Switch the vacuum pump on or off
    pub async fn vacuum_pump(&mut self, on: bool) -> Result<()> {
        info!("Vacuum pump {}", if on { "on" } else { "off" });
        self.exchange(
            &Frame::with_data(Command::VacuumPump, vec![u8::from(on)]),
            self.timeout(),
        )
        .await?;
        Ok(())
    }

    /// Auto-prime the dispensers
    ///
    /// `device` selects a single dispenser; `None` primes all of them.
    pub async fn auto_prime(&mut self, device: Option<u8>) -> Result<()> {
        info!("Auto-priming dispensers");
        self.exchange(
            &Frame::with_data(Command::AutoPrime, vec![device.unwrap_or(0)]),
            self.timeout(),
        )
        .await?;
        Ok(())
    }
}
