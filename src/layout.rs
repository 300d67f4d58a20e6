//! Path layout of the sysfs GPIO class.
//!
//! Every path the crate touches is built here, so the `/sys/class/gpio`
//! contract lives in one place:
//!
//! ```text
//! <root>/export
//! <root>/unexport
//! <root>/gpio<N>/direction
//! <root>/gpio<N>/edge
//! <root>/gpio<N>/active_low
//! <root>/gpio<N>/value
//! ```

use std::path::{Component, Path, PathBuf};

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinAttr {
    Direction,
    Edge,
    ActiveLow,
    Value,
}

impl PinAttr {
    pub fn file_name(self) -> &'static str {
        match self {
            PinAttr::Direction => "direction",
            PinAttr::Edge => "edge",
            PinAttr::ActiveLow => "active_low",
            PinAttr::Value => "value",
        }
    }

    fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "direction" => Some(PinAttr::Direction),
            "edge" => Some(PinAttr::Edge),
            "active_low" => Some(PinAttr::ActiveLow),
            "value" => Some(PinAttr::Value),
            _ => None,
        }
    }
}

/// A file of the GPIO class, as recognised by [`SysfsLayout::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysfsNode {
    Export,
    Unexport,
    Attr { number: u32, attr: PinAttr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsLayout {
    root: PathBuf,
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl SysfsLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn export_path(&self) -> PathBuf {
        self.root.join("export")
    }

    pub fn unexport_path(&self) -> PathBuf {
        self.root.join("unexport")
    }

    pub fn pin_dir(&self, number: u32) -> PathBuf {
        self.root.join(format!("gpio{number}"))
    }

    pub fn attr_path(&self, number: u32, attr: PinAttr) -> PathBuf {
        self.pin_dir(number).join(attr.file_name())
    }

    pub fn direction_path(&self, number: u32) -> PathBuf {
        self.attr_path(number, PinAttr::Direction)
    }

    pub fn edge_path(&self, number: u32) -> PathBuf {
        self.attr_path(number, PinAttr::Edge)
    }

    pub fn active_low_path(&self, number: u32) -> PathBuf {
        self.attr_path(number, PinAttr::ActiveLow)
    }

    pub fn value_path(&self, number: u32) -> PathBuf {
        self.attr_path(number, PinAttr::Value)
    }

    /// Maps a path back onto the node it names, `None` for anything outside the class.
    pub fn classify(&self, path: &Path) -> Option<SysfsNode> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rest
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<_>>()?;

        match parts.as_slice() {
            ["export"] => Some(SysfsNode::Export),
            ["unexport"] => Some(SysfsNode::Unexport),
            [dir, file] => {
                let digits = dir.strip_prefix("gpio")?;
                // "gpio007" is not a pin directory the kernel would create
                if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
                    return None;
                }
                let number = digits.parse().ok()?;
                let attr = PinAttr::from_file_name(file)?;
                Some(SysfsNode::Attr { number, attr })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_match_kernel_layout() {
        let layout = SysfsLayout::default();
        assert_eq!(layout.export_path(), Path::new("/sys/class/gpio/export"));
        assert_eq!(layout.unexport_path(), Path::new("/sys/class/gpio/unexport"));
        assert_eq!(
            layout.direction_path(22),
            Path::new("/sys/class/gpio/gpio22/direction")
        );
        assert_eq!(layout.edge_path(22), Path::new("/sys/class/gpio/gpio22/edge"));
        assert_eq!(
            layout.active_low_path(22),
            Path::new("/sys/class/gpio/gpio22/active_low")
        );
        assert_eq!(layout.value_path(22), Path::new("/sys/class/gpio/gpio22/value"));
    }

    #[test]
    fn classify_inverts_path_construction() {
        let layout = SysfsLayout::new("/tmp/fake");
        assert_eq!(
            layout.classify(&layout.export_path()),
            Some(SysfsNode::Export)
        );
        assert_eq!(
            layout.classify(&layout.edge_path(7)),
            Some(SysfsNode::Attr {
                number: 7,
                attr: PinAttr::Edge
            })
        );
        assert_eq!(layout.classify(Path::new("/tmp/fake/gpio07/value")), None);
        assert_eq!(layout.classify(Path::new("/tmp/fake/gpio7/label")), None);
        assert_eq!(layout.classify(Path::new("/sys/class/gpio/export")), None);
    }
}
