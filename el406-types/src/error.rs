pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown {what}: {value} (0x{value:02X}). Valid values: [{valid}]")]
    UnknownValue {
        what: &'static str,
        value: u8,
        valid: &'static str,
    },

    #[error("Unknown {what}: {value:?}. Valid values: [{valid}]")]
    UnknownLabel {
        what: &'static str,
        value: String,
        valid: &'static str,
    },
}
