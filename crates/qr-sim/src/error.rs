use qr_core::{CoreError, PacketId};
use qr_net::NetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Net(#[from] NetError),

    /// A packet id was injected twice.  Ids must come from the simulation's
    /// own sequence ([`Sim::new_packet`][crate::Sim::new_packet] or
    /// [`Sim::packet_ids`][crate::Sim::packet_ids]).
    #[error("packet {0} was already injected into this simulation")]
    DuplicatePacket(PacketId),

    /// Liveness failure detected by the driver: packets are outstanding but
    /// nothing has been delivered for too long (e.g. unreachable destination).
    #[error("scenario '{label}' stalled: no delivery for {idle_ticks} ticks with {outstanding} packets outstanding")]
    Stalled {
        label:       String,
        idle_ticks:  u64,
        outstanding: usize,
    },
}

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        SimError::Net(NetError::Core(e))
    }
}

pub type SimResult<T> = Result<T, SimError>;
