//! The echo area / modal prompt singleton.
//!
//! A prompt remembers the name of the command to re-invoke on submit
//! together with whatever argv it had already gathered (capped at 64) —
//! the same mechanism `switch-buffer` uses to redirect its own
//! re-invocation to a separately-registered `do-switch-buffer` command
//! rather than calling itself again. `take_submission` clears the prompt
//! before handing back the continuation: abort first, then re-invoke.

use std::time::{Duration, Instant};

use core_buffer::{BufferArena, BufferId};
use core_text::{Location, Region};

const SAVED_ARGV_CAP: usize = 64;

pub struct Minibuffer {
    buffer_id: BufferId,
    expires: Option<Instant>,
    prompt_text: String,
    prompt_active: bool,
    continuation: Option<String>,
    saved_argv: Vec<String>,
}

impl Minibuffer {
    pub fn new(buffer_id: BufferId) -> Self {
        Self {
            buffer_id,
            expires: None,
            prompt_text: String::new(),
            prompt_active: false,
            continuation: None,
            saved_argv: Vec::new(),
        }
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer_id
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn is_prompt_active(&self) -> bool {
        self.prompt_active
    }

    pub fn content(&self, buffers: &BufferArena) -> String {
        buffers.get(self.buffer_id).map(|b| b.line(0).as_str().to_string()).unwrap_or_default()
    }

    fn set_content(&self, buffers: &mut BufferArena, text: &str) {
        if let Some(buf) = buffers.get_mut(self.buffer_id) {
            let end = buf.end();
            buf.delete(Region::new(Location::origin(), end));
            buf.add(Location::origin(), text.as_bytes());
        }
    }

    /// Echo a status message for the default 4-second timeout. Ignored
    /// while a prompt is active, so a status message never stomps on a
    /// pending prompt's content.
    pub fn echo(&mut self, buffers: &mut BufferArena, message: impl Into<String>) {
        self.echo_timeout(buffers, 4, message);
    }

    pub fn echo_timeout(&mut self, buffers: &mut BufferArena, secs: u64, message: impl Into<String>) {
        if self.prompt_active {
            return;
        }
        self.set_content(buffers, &message.into());
        self.expires = Some(Instant::now() + Duration::from_secs(secs));
    }

    /// Open a modal prompt. `continuation` is the command to re-invoke on
    /// submit, and `saved_argv` is whatever args the prompting command
    /// already had in hand (e.g. M-x's own empty argv, or a partially
    /// filled one).
    pub fn prompt(
        &mut self,
        buffers: &mut BufferArena,
        prompt_text: impl Into<String>,
        continuation: impl Into<String>,
        saved_argv: Vec<String>,
    ) {
        self.set_content(buffers, "");
        self.prompt_text = prompt_text.into();
        self.prompt_active = true;
        self.continuation = Some(continuation.into());
        self.saved_argv = saved_argv;
        self.saved_argv.truncate(SAVED_ARGV_CAP);
        self.expires = None;
    }

    pub fn abort_prompt(&mut self, buffers: &mut BufferArena) {
        self.set_content(buffers, "");
        self.continuation = None;
        self.saved_argv.clear();
        self.prompt_active = false;
        self.expires = None;
    }

    /// Clear an expired echo. Called once per frame; a no-op while a
    /// prompt holds the echo area open.
    pub fn update(&mut self, buffers: &mut BufferArena, now: Instant) {
        if let Some(expires) = self.expires
            && now >= expires
            && !self.prompt_active
        {
            self.set_content(buffers, "");
            self.expires = None;
        }
    }

    /// Read the submitted line, splice it onto the saved argv, clear the
    /// prompt, and hand back `(continuation, argv)` for the caller to look
    /// up and invoke through the registry. Returns `None` if no prompt was
    /// active (ENTER pressed in a non-minibuffer window never reaches
    /// here, so this should only be called once the minibuffer is
    /// confirmed focused).
    pub fn take_submission(&mut self, buffers: &mut BufferArena) -> Option<(String, Vec<String>)> {
        let continuation = self.continuation.take()?;
        let line = self.content(buffers);
        let mut argv = std::mem::take(&mut self.saved_argv);
        argv.extend(line.split_whitespace().map(str::to_string));
        argv.truncate(SAVED_ARGV_CAP);
        self.abort_prompt(buffers);
        Some((continuation, argv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_buffer::Buffer;

    fn setup() -> (BufferArena, Minibuffer) {
        let mut arena = BufferArena::new();
        let id = arena.insert(Buffer::create("*minibuffer*"));
        (arena, Minibuffer::new(id))
    }

    #[test]
    fn echo_writes_into_minibuffer_buffer() {
        let (mut arena, mut mb) = setup();
        mb.echo(&mut arena, "hello");
        assert_eq!(mb.content(&arena), "hello");
    }

    #[test]
    fn echo_is_suppressed_while_prompt_active() {
        let (mut arena, mut mb) = setup();
        mb.prompt(&mut arena, "find file: ", "find-file", vec![]);
        mb.echo(&mut arena, "should not appear");
        assert_eq!(mb.content(&arena), "");
        assert!(mb.is_prompt_active());
    }

    #[test]
    fn take_submission_splices_saved_argv_and_clears_prompt() {
        let (mut arena, mut mb) = setup();
        mb.prompt(&mut arena, "execute: ", "run-command-interactive", vec!["switch-buffer".to_string()]);
        mb.set_content(&mut arena, "scratch");
        let (cmd, argv) = mb.take_submission(&mut arena).expect("prompt was active");
        assert_eq!(cmd, "run-command-interactive");
        assert_eq!(argv, vec!["switch-buffer".to_string(), "scratch".to_string()]);
        assert!(!mb.is_prompt_active());
    }

    #[test]
    fn abort_prompt_clears_saved_state() {
        let (mut arena, mut mb) = setup();
        mb.prompt(&mut arena, "find file: ", "find-file", vec![]);
        mb.abort_prompt(&mut arena);
        assert!(!mb.is_prompt_active());
        assert!(mb.take_submission(&mut arena).is_none());
    }
}
