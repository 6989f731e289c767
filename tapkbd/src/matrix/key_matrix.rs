use core::fmt::Debug;

use embedded_hal::{
    delay::DelayNs,
    digital::{Error as _, ErrorKind, InputPin, OutputPin},
};

/// Electrical level of every switch in one scan; `true` means closed.
pub type RawMatrix<const ROWS: usize, const COLS: usize> = [[bool; COLS]; ROWS];

pub trait KeySwitches<const ROWS: usize, const COLS: usize> {
    type Error: Debug;

    fn scan(&mut self, state: &mut RawMatrix<ROWS, COLS>) -> Result<(), Self::Error>;
}

/// Column-to-row diode matrix: each column is driven high in turn and the pulled-down
/// rows are read. Pin order is the coordinate binding.
pub struct KeyMatrix<I, O, D, const ROWS: usize, const COLS: usize> {
    rows: [I; ROWS],
    cols: [O; COLS],
    delay: D,
    settle_us: u32,
}

impl<I: InputPin, O: OutputPin, D: DelayNs, const ROWS: usize, const COLS: usize>
    KeyMatrix<I, O, D, ROWS, COLS>
{
    const DEFAULT_SETTLE_US: u32 = 20;

    pub fn new(rows: [I; ROWS], mut cols: [O; COLS], delay: D) -> Result<Self, ErrorKind> {
        for pin in cols.iter_mut() {
            pin.set_low().map_err(|e| e.kind())?;
        }
        Ok(KeyMatrix {
            rows,
            cols,
            delay,
            settle_us: Self::DEFAULT_SETTLE_US,
        })
    }

    /// Overrides how long a driven column settles before its rows are read.
    pub fn with_settle_time(mut self, settle_us: u32) -> Self {
        self.settle_us = settle_us;
        self
    }
}

impl<I: InputPin, O: OutputPin, D: DelayNs, const ROWS: usize, const COLS: usize>
    KeySwitches<ROWS, COLS> for KeyMatrix<I, O, D, ROWS, COLS>
{
    type Error = ErrorKind;

    fn scan(&mut self, state: &mut RawMatrix<ROWS, COLS>) -> Result<(), ErrorKind> {
        for (col, output) in self.cols.iter_mut().enumerate() {
            output.set_high().map_err(|e| e.kind())?;
            self.delay.delay_us(self.settle_us);
            let read: Result<(), ErrorKind> =
                self.rows
                    .iter_mut()
                    .enumerate()
                    .try_for_each(|(row, input)| {
                        state[row][col] = input.is_high().map_err(|e| e.kind())?;
                        Ok(())
                    });
            // release the column even when a row failed
            output.set_low().map_err(|e| e.kind())?;
            read?;
        }
        Ok(())
    }
}
