use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use sysgpio::{Direction, PinController, StdFsBackend, SysfsLayout, Value};

/// Regular files laid out like the GPIO class, for pins that are already "exported".
struct ScratchTree {
    root: PathBuf,
}

impl ScratchTree {
    fn new(name: &str, pins: &[u32]) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let root = std::env::temp_dir().join(format!("sysgpio-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("export"), "").unwrap();
        fs::write(root.join("unexport"), "").unwrap();
        for number in pins {
            let dir = root.join(format!("gpio{number}"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("direction"), "").unwrap();
            fs::write(dir.join("edge"), "").unwrap();
            fs::write(dir.join("active_low"), "").unwrap();
            fs::write(dir.join("value"), "0\n").unwrap();
        }
        Self { root }
    }

    fn controller(&self) -> PinController<StdFsBackend> {
        PinController::with_layout(Arc::new(StdFsBackend::new()), SysfsLayout::new(&self.root))
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).unwrap()
    }
}

impl Drop for ScratchTree {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

#[test]
fn control_files_receive_plain_tokens() {
    let tree = ScratchTree::new("control", &[22]);
    let controller = tree.controller();

    let pin = controller.export(22).unwrap();
    assert_eq!(tree.read("export"), "22");

    pin.set_direction(Direction::Output, 0u8).unwrap();
    assert_eq!(tree.read("gpio22/direction"), "low");

    pin.set_logic_level(1u8).unwrap();
    assert_eq!(tree.read("gpio22/active_low"), "1");

    pin.set_edge_trigger(1u8).unwrap();
    assert_eq!(tree.read("gpio22/edge"), "rising");

    pin.unexport().unwrap();
    assert_eq!(tree.read("unexport"), "22");
}

#[test]
fn loop_backed_value_file_round_trips() {
    let tree = ScratchTree::new("loopback", &[22]);
    let controller = tree.controller();
    let mut pin = controller.attach(22);

    pin.open(true).unwrap();
    assert_eq!(pin.read().unwrap(), Value::Inactive);

    pin.write(Value::Active).unwrap();
    assert_eq!(pin.read().unwrap(), Value::Active);
    assert_eq!(tree.read("gpio22/value"), "1\n");

    pin.write(Value::Inactive).unwrap();
    assert_eq!(pin.read().unwrap(), Value::Inactive);
    assert_eq!(tree.read("gpio22/value"), "0\n");

    pin.close().unwrap();
}

#[test]
fn garbage_in_value_file_is_unexpected_data() {
    let tree = ScratchTree::new("garbage", &[3]);
    fs::write(tree.root.join("gpio3/value"), "?\n").unwrap();
    let mut pin = tree.controller().attach(3);

    pin.open(false).unwrap();
    let err = pin.read().unwrap_err();
    assert_eq!(err.path(), Some(tree.root.join("gpio3/value").as_path()));
    assert!(matches!(err, sysgpio::GpioError::UnexpectedData { byte: b'?', .. }));
}

#[test]
fn empty_value_file_is_an_io_error() {
    let tree = ScratchTree::new("empty", &[3]);
    fs::write(tree.root.join("gpio3/value"), "").unwrap();
    let mut pin = tree.controller().attach(3);

    pin.open(false).unwrap();
    let err = pin.read().unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::UnexpectedEof));
}

#[test]
fn missing_pin_directory_fails_on_first_touch() {
    let tree = ScratchTree::new("missing", &[]);
    let controller = tree.controller();
    let pin = controller.attach(5);

    let err = pin.set_direction(Direction::Input, 0u8).unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
    assert_eq!(err.path(), Some(tree.root.join("gpio5/direction").as_path()));

    let mut pin = pin;
    let err = pin.open(false).unwrap_err();
    assert_eq!(err.path(), Some(tree.root.join("gpio5/value").as_path()));
}
