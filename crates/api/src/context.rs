use taskdeck_auth::Claim;

/// Authenticated identity for a request, decoded from the bearer token by the
/// auth middleware. Present on every protected route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Identity {
    claim: Claim,
}

impl Identity {
    pub fn new(claim: Claim) -> Self {
        Self { claim }
    }

    pub fn claim(&self) -> &Claim {
        &self.claim
    }
}
