pub mod exec;
pub mod library;
pub mod parse;
pub mod port;

use anyhow::Result;
use rfwd_core::{ForwardAllocation, PUBLISH_VAR};

/// One output line describing an allocation, newline included.
pub fn render_allocation(allocation: &ForwardAllocation, json: bool) -> Result<String> {
    if json {
        Ok(format!("{}\n", serde_json::to_string(allocation)?))
    } else {
        Ok(format!("{}={}\n", PUBLISH_VAR, allocation.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation() -> ForwardAllocation {
        ForwardAllocation {
            port: 44284,
            forward_to: "127.0.0.1:1000".to_string(),
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(
            render_allocation(&allocation(), false).unwrap(),
            "SSH_RFWD=44284\n"
        );
    }

    #[test]
    fn test_render_json() {
        assert_eq!(
            render_allocation(&allocation(), true).unwrap(),
            "{\"port\":44284,\"forward_to\":\"127.0.0.1:1000\"}\n"
        );
    }
}
