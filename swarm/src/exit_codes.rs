#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// The run completed and the report was written, whatever the readiness verdict.
    Success = 0,

    /// The pre-flight request to the landing route failed at the transport level.
    TargetUnreachable = 20,

    /// Invalid CLI/config/options (bad flags, unreadable config file, out-of-range values).
    InvalidInput = 30,

    /// Internal/runtime error (report write failures, IO errors).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
