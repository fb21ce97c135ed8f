/// Ticket handed out for one async request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Latest-request-wins bookkeeping for debounced network calls.
///
/// Each new request takes a ticket; a response is only applied if its
/// ticket is still the newest one issued. Older responses are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    /// Invalidate every outstanding ticket.
    pub fn cancel(&mut self) {
        self.latest += 1;
    }
}
