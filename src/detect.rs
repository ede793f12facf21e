//! Transport detection.
//!
//! The direct bus is probed first, then the pass-through path. The first
//! transport whose `WIA` register reads back the AK8963 identity is bound;
//! nothing is bound when neither does.

use embedded_hal::delay::DelayNs;

use crate::interface::{Absent, Ak8963Interface, Transport, TransportKind};
use crate::log::{debug, trace};
use crate::registers::{EXPECTED_WIA, REG_WIA};

/// The transports a board may expose the magnetometer on.
pub struct Detector<D, P> {
    direct: Option<D>,
    pass_through: Option<P>,
}

impl<D, P> Detector<D, P> {
    /// Creates a detector over both candidate transports.
    pub fn new(direct: Option<D>, pass_through: Option<P>) -> Self {
        Self {
            direct,
            pass_through,
        }
    }

    /// Consumes the detector and returns the candidate transports.
    pub fn release(self) -> (Option<D>, Option<P>) {
        (self.direct, self.pass_through)
    }
}

impl<D> Detector<D, Absent> {
    /// Creates a detector for a board with only the direct bus.
    pub fn direct_only(direct: D) -> Self {
        Self::new(Some(direct), None)
    }
}

impl<P> Detector<Absent, P> {
    /// Creates a detector for a board with only the pass-through path.
    pub fn pass_through_only(pass_through: P) -> Self {
        Self::new(None, Some(pass_through))
    }
}

impl<D, P> Detector<D, P>
where
    D: Ak8963Interface,
    P: Ak8963Interface,
{
    /// Finds which transport exposes the magnetometer, without binding it.
    ///
    /// Bus errors count as "not found" on that transport.
    pub fn probe(&mut self, delay: &mut impl DelayNs) -> Option<TransportKind> {
        if let Some(direct) = self.direct.as_mut() {
            if identity_matches(direct) {
                debug!("ak8963 found on direct bus");
                return Some(TransportKind::Direct);
            }
        }

        if let Some(pass_through) = self.pass_through.as_mut() {
            if pass_through.setup(delay).is_ok() && identity_matches(pass_through) {
                debug!("ak8963 found behind pass-through master");
                return Some(TransportKind::PassThrough);
            }
        }

        debug!("ak8963 not detected");
        None
    }

    /// Binds the first transport that exposes the magnetometer.
    ///
    /// On failure the detector is handed back unchanged so its buses can be
    /// reclaimed or probed again.
    pub fn detect(mut self, delay: &mut impl DelayNs) -> core::result::Result<Transport<D, P>, Self> {
        let found = self.probe(delay);
        match (found, self.direct, self.pass_through) {
            (Some(TransportKind::Direct), Some(direct), _) => Ok(Transport::Direct(direct)),
            (Some(TransportKind::PassThrough), _, Some(pass_through)) => {
                Ok(Transport::PassThrough(pass_through))
            }
            (_, direct, pass_through) => Err(Self::new(direct, pass_through)),
        }
    }
}

fn identity_matches<I: Ak8963Interface>(iface: &mut I) -> bool {
    match iface.read_register(REG_WIA) {
        Ok(id) => {
            trace!("ak8963 probe read wia = {}", id);
            id == EXPECTED_WIA
        }
        Err(_) => false,
    }
}
