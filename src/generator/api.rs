use tokio::sync::watch;
use tracing::info;

use crate::generator::config::GeneratorConfig;
use crate::generator::dispatcher::DispatcherSettings;
use crate::generator::emitter::RecordEmitter;
use crate::generator::error::GeneratorError;
use crate::generator::resource::ResourceDescriptor;
use crate::generator::session::Session;
use crate::generator::shutdown::{RunOutcome, ShutdownCoordinator};
use crate::generator::transport::{Capabilities, LogTransport, TransportSelector};

/// Run a full session over a ready transport
pub async fn run_with_transport<T: LogTransport>(
    config: &GeneratorConfig,
    transport: T,
    shutdown: watch::Receiver<bool>,
) -> Result<RunOutcome, GeneratorError> {
    config.validate()?;

    let session = Session::new(
        ResourceDescriptor::from_config(config),
        transport,
        DispatcherSettings::from_config(config),
    );
    Ok(emit_and_close(config, session, shutdown).await)
}

/// Negotiate the transport against `capabilities`, then run a full session.
///
/// A missing capability fails before any record is emitted.
pub async fn run_with_capabilities(
    config: &GeneratorConfig,
    capabilities: Capabilities,
    shutdown: watch::Receiver<bool>,
) -> Result<RunOutcome, GeneratorError> {
    config.validate()?;

    let selected = TransportSelector::new(capabilities).select(config)?;
    let session = Session::open(config, selected);
    Ok(emit_and_close(config, session, shutdown).await)
}

/// Run with the transports compiled into this binary
pub async fn run(
    config: &GeneratorConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<RunOutcome, GeneratorError> {
    run_with_capabilities(config, Capabilities::compiled(), shutdown).await
}

async fn emit_and_close(
    config: &GeneratorConfig,
    session: Session,
    shutdown: watch::Receiver<bool>,
) -> RunOutcome {
    info!(
        records = config.record_count,
        protocol = %session.protocol(),
        endpoint = session.endpoint(),
        "Sending OTLP logs"
    );

    let emitter = RecordEmitter::from_config(config);
    ShutdownCoordinator::new(session)
        .run(move |sink| emitter.run(sink, shutdown))
        .await
}
