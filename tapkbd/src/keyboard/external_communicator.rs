use super::KeyboardReport;

/// Transport delivering reports to the host.
pub trait ExternalCommunicator {
    type Error;
    fn is_ready(&self) -> bool;
    fn send_report(&self, report: &KeyboardReport) -> Result<(), Self::Error>;
}
