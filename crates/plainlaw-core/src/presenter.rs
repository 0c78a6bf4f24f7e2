//! Control enablement derived from request state.
//!
//! Front ends never toggle controls themselves; they render whatever
//! [`project`] returns for the current states.

use crate::state::RequestState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub submit_enabled: bool,
    /// Extraction or simplification is running.
    pub show_spinner: bool,
    pub chat_input_enabled: bool,
    pub send_enabled: bool,
    /// A chat answer is pending.
    pub chat_pending: bool,
}

pub fn project(
    ingestion: &RequestState,
    simplification: &RequestState,
    chat: &RequestState,
) -> Controls {
    let processing = ingestion.is_in_flight() || simplification.is_in_flight();
    let asking = chat.is_in_flight();

    Controls {
        submit_enabled: !processing,
        show_spinner: processing,
        chat_input_enabled: !asking,
        send_enabled: !asking,
        chat_pending: asking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_everything_enabled() {
        let controls = project(&RequestState::Idle, &RequestState::Idle, &RequestState::Idle);
        assert!(controls.submit_enabled);
        assert!(!controls.show_spinner);
        assert!(controls.send_enabled);
        assert!(controls.chat_input_enabled);
    }

    #[test]
    fn test_extraction_in_flight_disables_submit() {
        let controls = project(&RequestState::InFlight, &RequestState::Idle, &RequestState::Idle);
        assert!(!controls.submit_enabled);
        assert!(controls.show_spinner);
        assert!(controls.send_enabled);
    }

    #[test]
    fn test_failed_states_reenable() {
        let failed = RequestState::Failed("API Error: timeout".to_string());
        let controls = project(&RequestState::Succeeded, &failed, &failed);
        assert!(controls.submit_enabled);
        assert!(!controls.show_spinner);
        assert!(controls.send_enabled);
    }

    #[test]
    fn test_chat_in_flight_disables_send_only() {
        let controls = project(&RequestState::Idle, &RequestState::Idle, &RequestState::InFlight);
        assert!(!controls.send_enabled);
        assert!(!controls.chat_input_enabled);
        assert!(controls.chat_pending);
        assert!(controls.submit_enabled);
    }
}
