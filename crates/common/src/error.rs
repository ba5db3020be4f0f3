/// Errors that can escape a resize dispatch or a lifecycle transition.
///
/// Detach, dispose and unmount never produce one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("{0} handle is already borrowed")]
    HandleBusy(&'static str),
    #[error("resize sync was detached and cannot be attached again")]
    Reattach,
    #[error("render backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_cause() {
        assert_eq!(
            ViewportError::HandleBusy("camera").to_string(),
            "camera handle is already borrowed"
        );
        assert!(ViewportError::Backend("lost".into()).to_string().contains("lost"));
    }
}
