use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::backend::{AccessMode, FileBackend, FileHandle};
use crate::config::{Direction, Edge, GpioConfig, LogicLevel, PinConfig, Value};
use crate::error::GpioError;
use crate::layout::SysfsLayout;

/// Entry point to the sysfs GPIO class: exports pins and writes their control files.
pub struct PinController<B: FileBackend> {
    backend: Arc<B>,
    layout: Arc<SysfsLayout>,
}

impl<B: FileBackend> Clone for PinController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            layout: Arc::clone(&self.layout),
        }
    }
}

impl<B: FileBackend> PinController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_layout(backend, SysfsLayout::default())
    }

    pub fn with_layout(backend: Arc<B>, layout: SysfsLayout) -> Self {
        Self {
            backend,
            layout: Arc::new(layout),
        }
    }

    pub fn from_config(backend: Arc<B>, config: &GpioConfig) -> Self {
        Self::with_layout(backend, SysfsLayout::new(config.sysfs_root.clone()))
    }

    pub fn layout(&self) -> &SysfsLayout {
        &self.layout
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Opens `path` write-only, writes `contents` and releases the file.
    fn write_attr(&self, path: &Path, contents: &str) -> Result<(), GpioError> {
        debug!("writing {contents:?} to {}", path.display());
        let mut file = self
            .backend
            .open(path, AccessMode::WriteOnly)
            .map_err(GpioError::io(path))?;
        file.write_bytes(contents.as_bytes())
            .map_err(GpioError::io(path))?;
        file.close().map_err(GpioError::io(path))
    }

    /// Claims `number` from the kernel. A pin that is already exported is an error.
    pub fn export(&self, number: u32) -> Result<Pin<B>, GpioError> {
        self.write_attr(&self.layout.export_path(), &number.to_string())?;
        info!("exported gpio {number}");
        Ok(self.attach(number))
    }

    /// Wraps a pin that is already exported, by another process or an earlier run,
    /// without touching the export file.
    pub fn attach(&self, number: u32) -> Pin<B> {
        Pin {
            number,
            value_path: self.layout.value_path(number),
            controller: self.clone(),
            handle: None,
            writable: false,
        }
    }

    /// Returns `number` to the kernel without needing a [`Pin`], e.g. to clear a stale export.
    pub fn unexport(&self, number: u32) -> Result<(), GpioError> {
        self.write_attr(&self.layout.unexport_path(), &number.to_string())?;
        info!("unexported gpio {number}");
        Ok(())
    }

    /// Exports `number`, drives it as an output starting at `initial_value` and opens it read-write.
    pub fn new_output<V>(&self, number: u32, initial_value: V) -> Result<Pin<B>, GpioError>
    where
        V: TryInto<Value>,
        GpioError: From<V::Error>,
    {
        let initial_value = initial_value.try_into()?;
        self.setup(number, &PinConfig::output(initial_value))
    }

    /// Exports `number` as an input with the given edge trigger and opens it read-only.
    pub fn new_input(&self, number: u32, edge: Edge) -> Result<Pin<B>, GpioError> {
        self.setup(number, &PinConfig::input(edge))
    }

    /// Runs export, configuration and open for one pin.
    ///
    /// If anything after the export fails the pin is unexported again before
    /// the error is returned. A failing unexport is only logged.
    pub fn setup(&self, number: u32, config: &PinConfig) -> Result<Pin<B>, GpioError> {
        let mut pin = self.export(number)?;

        match pin.configure(config) {
            Ok(()) => Ok(pin),
            Err(e) => {
                if let Err(cleanup) = pin.unexport() {
                    warn!("failed to unexport gpio {number} after setup error: {cleanup}");
                }
                Err(e)
            }
        }
    }

    /// Sets up every configured pin in ascending order, stopping at the first failure.
    /// Pins set up before the failure are closed but stay exported.
    pub fn setup_all(&self, config: &GpioConfig) -> Result<Vec<Pin<B>>, GpioError> {
        let mut numbers: Vec<u32> = config.pins.keys().copied().collect();
        numbers.sort_unstable();

        numbers
            .into_iter()
            .map(|number| self.setup(number, &config.pins[&number]))
            .collect()
    }
}

/// An exported pin. Holds the value file open between [`Pin::open`] and [`Pin::close`];
/// the handle is also released when the pin is dropped.
pub struct Pin<B: FileBackend> {
    number: u32,
    value_path: PathBuf,
    controller: PinController<B>,
    handle: Option<B::Handle>,
    writable: bool,
}

impl<B: FileBackend> Pin<B> {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn value_path(&self) -> &Path {
        &self.value_path
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.handle.is_some() && self.writable
    }

    fn configure(&mut self, config: &PinConfig) -> Result<(), GpioError> {
        self.set_logic_level(config.logic_level)?;
        // `low`/`high` set the physical level, so an active-low initial value is inverted
        let initial_level = match config.logic_level {
            LogicLevel::ActiveHigh => config.initial_value,
            LogicLevel::ActiveLow => Value::from(!config.initial_value.is_active()),
        };
        self.set_direction(config.direction, initial_level)?;
        if config.direction == Direction::Input || config.edge != Edge::None {
            self.set_edge_trigger(config.edge)?;
        }
        self.open(config.direction == Direction::Output)
    }

    /// Writes `in`, `low` or `high` to the direction file.
    ///
    /// For outputs the initial value is applied together with the direction.
    /// It is ignored for inputs.
    pub fn set_direction<V>(&self, direction: Direction, initial_value: V) -> Result<(), GpioError>
    where
        V: TryInto<Value>,
        GpioError: From<V::Error>,
    {
        let token = match direction {
            Direction::Input => "in",
            Direction::Output => match initial_value.try_into()? {
                Value::Inactive => "low",
                Value::Active => "high",
            },
        };
        let path = self.controller.layout.direction_path(self.number);
        self.controller.write_attr(&path, token)
    }

    pub fn set_input(&self) -> Result<(), GpioError> {
        self.set_direction(Direction::Input, Value::Inactive)
    }

    pub fn set_output<V>(&self, initial_value: V) -> Result<(), GpioError>
    where
        V: TryInto<Value>,
        GpioError: From<V::Error>,
    {
        self.set_direction(Direction::Output, initial_value)
    }

    pub fn set_edge_trigger<E>(&self, edge: E) -> Result<(), GpioError>
    where
        E: TryInto<Edge>,
        GpioError: From<E::Error>,
    {
        let edge = edge.try_into()?;
        let path = self.controller.layout.edge_path(self.number);
        self.controller.write_attr(&path, edge.token())
    }

    pub fn set_logic_level<L>(&self, level: L) -> Result<(), GpioError>
    where
        L: TryInto<LogicLevel>,
        GpioError: From<L::Error>,
    {
        let level = level.try_into()?;
        let path = self.controller.layout.active_low_path(self.number);
        self.controller.write_attr(&path, level.token())
    }

    /// Opens the value file, read-write if `writable`, otherwise read-only.
    /// A handle held from an earlier open is released first.
    pub fn open(&mut self, writable: bool) -> Result<(), GpioError> {
        self.close()?;

        let mode = if writable {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };
        let handle = self
            .controller
            .backend
            .open(&self.value_path, mode)
            .map_err(GpioError::io(&self.value_path))?;
        debug!("opened {} ({mode:?})", self.value_path.display());

        self.handle = Some(handle);
        self.writable = writable;
        Ok(())
    }

    /// Reads the current value. The file is rewound first, it holds state rather than a stream.
    pub fn read(&mut self) -> Result<Value, GpioError> {
        let number = self.number;
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| GpioError::InvalidState(format!("gpio {number} is not open")))?;

        handle.rewind().map_err(GpioError::io(&self.value_path))?;
        let byte = handle
            .read_byte()
            .map_err(GpioError::io(&self.value_path))?;

        match byte {
            b'0' => Ok(Value::Inactive),
            b'1' => Ok(Value::Active),
            byte => Err(GpioError::UnexpectedData {
                path: self.value_path.clone(),
                byte,
            }),
        }
    }

    pub fn write<V>(&mut self, value: V) -> Result<(), GpioError>
    where
        V: TryInto<Value>,
        GpioError: From<V::Error>,
    {
        let value = value.try_into()?;

        let number = self.number;
        let handle = match self.handle.as_mut() {
            Some(handle) if self.writable => handle,
            Some(_) => {
                return Err(GpioError::InvalidState(format!(
                    "gpio {number} was opened read-only"
                )));
            }
            None => {
                return Err(GpioError::InvalidState(format!(
                    "gpio {number} is not open"
                )));
            }
        };

        handle.rewind().map_err(GpioError::io(&self.value_path))?;
        handle
            .write_bytes(&[value.as_byte()])
            .map_err(GpioError::io(&self.value_path))
    }

    pub fn high(&mut self) -> Result<(), GpioError> {
        self.write(Value::Active)
    }

    pub fn low(&mut self) -> Result<(), GpioError> {
        self.write(Value::Inactive)
    }

    /// Releases the value file. Does nothing if the pin is not open.
    pub fn close(&mut self) -> Result<(), GpioError> {
        if let Some(handle) = self.handle.take() {
            self.writable = false;
            handle.close().map_err(GpioError::io(&self.value_path))?;
            debug!("closed {}", self.value_path.display());
        }
        Ok(())
    }

    /// Releases the value file and returns the pin to the kernel.
    pub fn unexport(mut self) -> Result<(), GpioError> {
        let closed = self.close();
        self.controller.unexport(self.number)?;
        closed
    }
}
