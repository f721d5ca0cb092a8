use std::io::{self, BufRead};

/// Where debugger commands are read from.
#[allow(private_interfaces)]
#[derive(Debug)]
pub enum Source {
    Argument(Argument),
    Stdin(Stdin),
}

/// Commands given with `--command`, separated by `;` or newlines.
#[derive(Debug)]
struct Argument {
    buffer: String,
    /// Byte index
    cursor: usize,
}

/// Line-buffered standard input, interactive or piped.
#[derive(Debug)]
struct Stdin {
    stdin: io::Stdin,
    /// Command must be stored somewhere to be referenced
    buffer: String,
}

pub trait SourceRead {
    /// `None` indicates EOF
    /// Returned string slice MAY include leading or trailing whitespace
    fn read(&mut self) -> Option<&str>;
}

impl Source {
    pub fn from(argument: Option<String>) -> Self {
        match argument {
            Some(argument) => Self::Argument(Argument::from(argument)),
            None => Self::Stdin(Stdin::new()),
        }
    }

    /// Whether commands come from a script rather than a user.
    pub fn is_scripted(&self) -> bool {
        matches!(self, Self::Argument(_))
    }
}

impl SourceRead for Source {
    fn read(&mut self) -> Option<&str> {
        let scripted = self.is_scripted();
        let command = match self {
            Self::Argument(argument) => argument.read(),
            Self::Stdin(stdin) => stdin.read(),
        };
        // Echo scripted commands after the prompt, as a user would have typed them
        if scripted {
            if let Some(command) = command {
                dprintln!(Sometimes, "{}", command.trim());
            }
        }
        command
    }
}

impl Argument {
    pub fn from(source: String) -> Self {
        Self {
            buffer: source,
            cursor: 0,
        }
    }
}

impl SourceRead for Argument {
    fn read(&mut self) -> Option<&str> {
        // EOF
        if self.cursor >= self.buffer.len() {
            return None;
        }

        // Take characters until delimiter
        let start = self.cursor;
        let rest = &self.buffer[start..];
        let len = rest.find(|ch: char| ch == '\n' || ch == ';').unwrap_or(rest.len());
        self.cursor += len + 1; // sizeof('\n' or ';')

        self.buffer.get(start..start + len)
    }
}

impl Stdin {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            buffer: String::new(),
        }
    }
}

impl SourceRead for Stdin {
    fn read(&mut self) -> Option<&str> {
        self.buffer.clear();
        match self.stdin.lock().read_line(&mut self.buffer) {
            // Unreadable input is treated like EOF
            Ok(0) | Err(_) => None,
            Ok(_) => Some(self.buffer.trim_end_matches(&['\n', '\r'][..])),
        }
    }
}
