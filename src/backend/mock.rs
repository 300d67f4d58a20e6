use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::backend::{AccessMode, FileBackend, FileHandle};
use crate::config::{Direction, Edge, LogicLevel};
use crate::layout::{PinAttr, SysfsLayout, SysfsNode};

const MOCK_DEFAULT_LINE_COUNT: u32 = 64;

/// In-memory stand-in for the sysfs GPIO class.
///
/// Writes to `export`/`unexport` create and remove pin directories the way the
/// kernel does, attribute writes are validated against the tokens the kernel
/// accepts, and every write attempt is recorded for inspection.
#[derive(Clone)]
pub struct MockFsBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWrite {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

struct MockState {
    layout: SysfsLayout,
    line_count: u32,
    pins: FxHashMap<u32, MockPinState>,
    writes: Vec<MockWrite>,
    open_failures: FxHashMap<PathBuf, io::ErrorKind>,
    open_handles: usize,
}

#[derive(Clone)]
struct MockPinState {
    output: bool,
    edge: Edge,
    active_low: bool,
    // physical line level, the logical value is level ^ active_low
    level: bool,
    raw_value: Option<Vec<u8>>,
}

impl Default for MockPinState {
    fn default() -> Self {
        Self {
            output: false,
            edge: Edge::None,
            active_low: false,
            level: false,
            raw_value: None,
        }
    }
}

impl Default for MockFsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFsBackend {
    pub fn new() -> Self {
        Self::with_layout(SysfsLayout::default())
    }

    pub fn with_layout(layout: SysfsLayout) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                layout,
                line_count: MOCK_DEFAULT_LINE_COUNT,
                pins: FxHashMap::default(),
                writes: Vec::new(),
                open_failures: FxHashMap::default(),
                open_handles: 0,
            })),
        }
    }

    /// Lines `0..line_count` may be exported.
    pub fn with_line_count(self, line_count: u32) -> Self {
        self.state.lock().line_count = line_count;
        self
    }

    pub fn is_exported(&self, number: u32) -> bool {
        self.state.lock().pins.contains_key(&number)
    }

    pub fn direction(&self, number: u32) -> Option<Direction> {
        self.state.lock().pins.get(&number).map(|pin| {
            if pin.output {
                Direction::Output
            } else {
                Direction::Input
            }
        })
    }

    pub fn edge(&self, number: u32) -> Option<Edge> {
        self.state.lock().pins.get(&number).map(|pin| pin.edge)
    }

    pub fn logic_level(&self, number: u32) -> Option<LogicLevel> {
        self.state.lock().pins.get(&number).map(|pin| {
            if pin.active_low {
                LogicLevel::ActiveLow
            } else {
                LogicLevel::ActiveHigh
            }
        })
    }

    /// Physical level of the line, ignoring polarity.
    pub fn line_level(&self, number: u32) -> Option<bool> {
        self.state.lock().pins.get(&number).map(|pin| pin.level)
    }

    /// Drives the physical line, as external hardware would for an input.
    /// Returns `false` if the pin is not exported.
    pub fn set_line_level(&self, number: u32, high: bool) -> bool {
        match self.state.lock().pins.get_mut(&number) {
            Some(pin) => {
                pin.level = high;
                pin.raw_value = None;
                true
            }
            None => false,
        }
    }

    /// Replaces the rendered contents of the value file until the next value write.
    pub fn inject_raw_value(&self, number: u32, contents: &[u8]) -> bool {
        match self.state.lock().pins.get_mut(&number) {
            Some(pin) => {
                pin.raw_value = Some(contents.to_vec());
                true
            }
            None => false,
        }
    }

    /// Makes every later open of `path` fail with `kind`.
    pub fn fail_open(&self, path: &Path, kind: io::ErrorKind) {
        self.state
            .lock()
            .open_failures
            .insert(path.to_path_buf(), kind);
    }

    pub fn writes(&self) -> Vec<MockWrite> {
        self.state.lock().writes.clone()
    }

    pub fn writes_to(&self, path: &Path) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.path == path)
            .map(|w| w.data.clone())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }
}

impl FileBackend for MockFsBackend {
    type Handle = MockHandle;

    fn open(&self, path: &Path, mode: AccessMode) -> io::Result<MockHandle> {
        let mut state = self.state.lock();
        if let Some(kind) = state.open_failures.get(path) {
            return Err(io::Error::from(*kind));
        }
        let node = state
            .layout
            .classify(path)
            .ok_or_else(|| errno(io::ErrorKind::NotFound, "No such file or directory"))?;

        match node {
            SysfsNode::Export | SysfsNode::Unexport => {
                if mode.can_read() {
                    return Err(errno(io::ErrorKind::PermissionDenied, "Permission denied"));
                }
            }
            SysfsNode::Attr { number, .. } => {
                if !state.pins.contains_key(&number) {
                    return Err(errno(io::ErrorKind::NotFound, "No such file or directory"));
                }
            }
        }

        state.open_handles += 1;
        Ok(MockHandle {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
            node,
            mode,
            pos: 0,
        })
    }
}

pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
    path: PathBuf,
    node: SysfsNode,
    mode: AccessMode,
    pos: usize,
}

impl FileHandle for MockHandle {
    fn rewind(&mut self) -> io::Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        if !self.mode.can_read() {
            return Err(errno(io::ErrorKind::PermissionDenied, "Bad file descriptor"));
        }
        let contents = self
            .state
            .lock()
            .render(self.node)
            .ok_or_else(|| errno(io::ErrorKind::NotFound, "No such device"))?;
        let byte = contents
            .get(self.pos)
            .copied()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        self.pos += 1;
        Ok(byte)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        if !self.mode.can_write() {
            return Err(errno(io::ErrorKind::PermissionDenied, "Bad file descriptor"));
        }
        let mut state = self.state.lock();
        state.writes.push(MockWrite {
            path: self.path.clone(),
            data: buf.to_vec(),
        });
        state.apply_write(self.node, buf)
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.state.lock().open_handles -= 1;
    }
}

impl MockState {
    fn render(&self, node: SysfsNode) -> Option<Vec<u8>> {
        let SysfsNode::Attr { number, attr } = node else {
            return Some(Vec::new());
        };
        let pin = self.pins.get(&number)?;

        let text = match attr {
            PinAttr::Direction => (if pin.output { "out" } else { "in" }).to_string(),
            PinAttr::Edge => pin.edge.token().to_string(),
            PinAttr::ActiveLow => u8::from(pin.active_low).to_string(),
            PinAttr::Value => {
                if let Some(raw) = &pin.raw_value {
                    return Some(raw.clone());
                }
                u8::from(pin.level ^ pin.active_low).to_string()
            }
        };
        Some(format!("{text}\n").into_bytes())
    }

    fn apply_write(&mut self, node: SysfsNode, buf: &[u8]) -> io::Result<()> {
        let text = std::str::from_utf8(buf)
            .map_err(|_| invalid_argument())?
            .trim_end();

        match node {
            SysfsNode::Export => {
                let number = parse_line(text)?;
                if number >= self.line_count {
                    return Err(invalid_argument());
                }
                if self.pins.contains_key(&number) {
                    return Err(errno(
                        io::ErrorKind::ResourceBusy,
                        "Device or resource busy",
                    ));
                }
                self.pins.insert(number, MockPinState::default());
            }
            SysfsNode::Unexport => {
                let number = parse_line(text)?;
                self.pins.remove(&number).ok_or_else(invalid_argument)?;
            }
            SysfsNode::Attr { number, attr } => {
                let pin = self
                    .pins
                    .get_mut(&number)
                    .ok_or_else(|| errno(io::ErrorKind::NotFound, "No such device"))?;
                match attr {
                    PinAttr::Direction => match text {
                        "in" => pin.output = false,
                        "out" | "low" => {
                            pin.output = true;
                            pin.level = false;
                            pin.raw_value = None;
                        }
                        "high" => {
                            pin.output = true;
                            pin.level = true;
                            pin.raw_value = None;
                        }
                        _ => return Err(invalid_argument()),
                    },
                    PinAttr::Edge => {
                        pin.edge = match text {
                            "none" => Edge::None,
                            "rising" => Edge::Rising,
                            "falling" => Edge::Falling,
                            "both" => Edge::Both,
                            _ => return Err(invalid_argument()),
                        }
                    }
                    PinAttr::ActiveLow => pin.active_low = parse_flag(text)?,
                    PinAttr::Value => {
                        if !pin.output {
                            return Err(errno(
                                io::ErrorKind::PermissionDenied,
                                "Operation not permitted",
                            ));
                        }
                        pin.level = parse_flag(text)? ^ pin.active_low;
                        pin.raw_value = None;
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_line(text: &str) -> io::Result<u32> {
    text.parse().map_err(|_| invalid_argument())
}

fn parse_flag(text: &str) -> io::Result<bool> {
    match text {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(invalid_argument()),
    }
}

fn invalid_argument() -> io::Error {
    errno(io::ErrorKind::InvalidInput, "Invalid argument")
}

fn errno(kind: io::ErrorKind, msg: &'static str) -> io::Error {
    io::Error::new(kind, msg)
}
