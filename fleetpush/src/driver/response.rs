//! Result of one command sent through the managed driver.

use std::fmt;
use std::time::Duration;

/// Output of a single command, as seen between sending it and the next prompt.
#[derive(Debug, Clone)]
pub struct Response {
    /// The line that was sent.
    pub command: String,

    /// Output with the command echo and trailing prompt removed.
    pub result: String,

    /// Everything the device printed, echo and prompt included.
    pub raw_result: String,

    /// Prompt that ended the output. Empty if the device closed the session.
    pub prompt: String,

    pub elapsed: Duration,

    /// Failure marker found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    pub fn new(
        command: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        let command = command.into();
        let raw_result = raw_result.into();
        let prompt = prompt.into();
        Self {
            result: normalize_output(&raw_result, &command, &prompt),
            command,
            raw_result,
            prompt,
            elapsed,
            failure_message: None,
        }
    }

    /// Mark the response as failed.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result)
    }
}

/// Strip the echoed command from the first line and the prompt from the last.
fn normalize_output(raw: &str, command: &str, prompt: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().map(|l| l.trim_end_matches('\r')).collect();

    if !command.is_empty() && lines.first().is_some_and(|l| l.trim_end().ends_with(command)) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if !prompt.is_empty() && lines.last().is_some_and(|l| l.trim() == prompt) {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let response = Response::new(
            "show vlan 100",
            "show vlan 100\r\nVLAN 100 active\r\nports: 2\r\nolt#",
            "olt#",
            Duration::ZERO,
        );
        assert_eq!(response.result, "VLAN 100 active\nports: 2");
        assert!(response.is_success());
    }

    #[test]
    fn test_echo_behind_prompt() {
        // Some CLIs redraw the prompt before echoing.
        let response = Response::new("end", "olt(config)# end\r\nolt#", "olt#", Duration::ZERO);
        assert_eq!(response.result, "");
    }

    #[test]
    fn test_failure_marker() {
        let response = Response::new("vlan x", "vlan x\r\n% Invalid input\r\nolt(config)#", "olt(config)#", Duration::ZERO)
            .with_failure("% Invalid input");
        assert!(!response.is_success());
        assert_eq!(response.to_string(), "% Invalid input");
    }
}
