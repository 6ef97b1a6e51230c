pub struct TracingService;

impl TracingService {
    /// Installs the global JSON subscriber. Safe to call more than once;
    /// later calls keep the subscriber already installed.
    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
            .try_init();

        Ok(())
    }
}
