// Join flow: validate the name, ask the server if it is free, then join
use protocol::Color;

use crate::error::ClientError;
use crate::network::{RequestId, Session};

/// Colors offered on the join screen; the default is a random pick.
pub const PALETTE: [Color; 6] = [
    Color::new(0x60, 0xa5, 0xfa),
    Color::new(0x34, 0xd3, 0x99),
    Color::new(0xf4, 0x72, 0xb6),
    Color::new(0xfb, 0xbf, 0x24),
    Color::new(0xa7, 0x8b, 0xfa),
    Color::new(0xf8, 0x71, 0x71),
];

/// Trimmed name, or `EmptyName` if nothing is left.
pub fn validate_name(raw: &str) -> Result<&str, ClientError> {
    let name = raw.trim();
    if name.is_empty() {
        Err(ClientError::EmptyName)
    } else {
        Ok(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingJoin {
    request: RequestId,
    name: String,
    color: Color,
}

/// What became of a `checkName` reply.
#[derive(Debug, Clone, PartialEq)]
pub enum NameCheckOutcome {
    /// The name was free and the join request went out.
    JoinSent { name: String, color: Color },
    /// Reply to a query we no longer care about.
    Ignored,
}

#[derive(Debug, Default)]
pub struct JoinFlow {
    pending: Option<PendingJoin>,
}

impl JoinFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a join attempt. Nothing is sent for a blank name or while
    /// disconnected. A new attempt replaces any attempt still in flight.
    pub fn submit(
        &mut self,
        session: &mut Session,
        name: &str,
        color: Color,
    ) -> Result<RequestId, ClientError> {
        let name = validate_name(name)?;
        if !session.is_connected() {
            return Err(ClientError::Disconnected);
        }
        let request = session.check_name(name)?;
        self.pending = Some(PendingJoin {
            request,
            name: name.to_string(),
            color,
        });
        Ok(request)
    }

    /// Handle the server's answer to a `checkName` query.
    pub fn on_name_checked(
        &mut self,
        session: &Session,
        request: RequestId,
        available: bool,
    ) -> Result<NameCheckOutcome, ClientError> {
        let pending = match self.pending.take() {
            Some(pending) if pending.request == request => pending,
            other => {
                self.pending = other;
                tracing::debug!("ignoring stale checkName reply #{request}");
                return Ok(NameCheckOutcome::Ignored);
            }
        };
        if !available {
            return Err(ClientError::NameTaken);
        }
        session.request_join(&pending.name, pending.color)?;
        Ok(NameCheckOutcome::JoinSent {
            name: pending.name,
            color: pending.color,
        })
    }

    /// Forget any attempt in flight (e.g. the session dropped).
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Inbound;
    use crate::network::tests::connected_session;
    use protocol::packets::ClientMessage;

    const BLUE: Color = PALETTE[0];

    #[test]
    fn test_blank_names_are_rejected_locally() {
        let (mut session, transport, _inbox) = connected_session();
        let mut flow = JoinFlow::new();
        for name in ["", "   ", "\t\n"] {
            assert_eq!(flow.submit(&mut session, name, BLUE), Err(ClientError::EmptyName));
        }
        assert!(transport.sent.borrow().is_empty());
        assert!(!flow.is_pending());
    }

    #[test]
    fn test_available_name_joins_with_trimmed_name() {
        let (mut session, transport, _inbox) = connected_session();
        let mut flow = JoinFlow::new();
        let request = flow.submit(&mut session, "  amy  ", BLUE).unwrap();

        let outcome = flow.on_name_checked(&session, request, true).unwrap();
        assert_eq!(
            outcome,
            NameCheckOutcome::JoinSent { name: "amy".into(), color: BLUE }
        );
        assert_eq!(
            transport.messages(),
            vec![
                ClientMessage::CheckName { request, name: "amy".into() },
                ClientMessage::Join { name: "amy".into(), color: BLUE },
            ]
        );
        assert!(!flow.is_pending());
    }

    #[test]
    fn test_taken_name_does_not_join() {
        let (mut session, transport, _inbox) = connected_session();
        let mut flow = JoinFlow::new();
        let request = flow.submit(&mut session, "amy", BLUE).unwrap();

        assert_eq!(
            flow.on_name_checked(&session, request, false),
            Err(ClientError::NameTaken)
        );
        assert_eq!(transport.messages().len(), 1);
        assert!(!flow.is_pending());
    }

    #[test]
    fn test_stale_reply_is_ignored() {
        let (mut session, transport, _inbox) = connected_session();
        let mut flow = JoinFlow::new();
        let old = flow.submit(&mut session, "amy", BLUE).unwrap();
        let new = flow.submit(&mut session, "bea", BLUE).unwrap();

        assert_eq!(flow.on_name_checked(&session, old, true), Ok(NameCheckOutcome::Ignored));
        assert!(flow.is_pending());
        assert!(matches!(
            flow.on_name_checked(&session, new, true),
            Ok(NameCheckOutcome::JoinSent { .. })
        ));
        assert_eq!(
            transport.messages().last(),
            Some(&ClientMessage::Join { name: "bea".into(), color: BLUE })
        );
    }

    #[test]
    fn test_disconnected_submit_sends_nothing() {
        let (mut session, transport, inbox) = connected_session();
        inbox.borrow_mut().push_back(Inbound::Closed);
        session.poll();

        let mut flow = JoinFlow::new();
        assert_eq!(flow.submit(&mut session, "amy", BLUE), Err(ClientError::Disconnected));
        assert!(transport.sent.borrow().is_empty());
    }
}
