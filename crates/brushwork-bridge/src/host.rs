use std::sync::{Arc, Mutex};

/// The notebook the bridge writes into.
pub trait NotebookHost {
    /// Puts `code` into the next input cell.
    fn set_next_input(&mut self, code: &str);

    fn copy_to_clipboard(&mut self, text: &str);
}

/// Host that only remembers what it was asked to do. Clones share their recordings.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    inputs: Arc<Mutex<Vec<String>>>,
    clipboard: Arc<Mutex<Vec<String>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn clipboard(&self) -> Vec<String> {
        self.clipboard.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl NotebookHost for RecordingHost {
    fn set_next_input(&mut self, code: &str) {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(code.to_string());
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        if let Ok(mut clipboard) = self.clipboard.lock() {
            clipboard.push(text.to_string());
        }
    }
}
