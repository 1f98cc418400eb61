//! The same calibration variables bound to any number of memory images. Addresses come
//! from the ELF and the symbol tree, values come from each image.
use crate::calib::codec::{ScalarType, Value, decode, dimension_descriptor};
use crate::calib::image::MemoryImage;
use crate::debug::{DataType, NodeId, SymbolTree};
use crate::elf::{ElfFile, VirtualAddr};
use crate::error::{CalibError, Result};
use std::path::Path;
use tracing::{info, warn};

/// Notified as values are read or written so that a UI can stay in sync.
pub trait CalibrationObserver {
    /// value is None if the bytes couldn't be read.
    fn value_changed(&mut self, image: usize, symbol: usize, value: Option<&Value>);

    /// All of the image's bindings were replaced.
    fn bindings_reset(&mut self, image: usize);
}

/// One variable within one image.
#[derive(Clone, Debug)]
pub struct Binding {
    pub node: NodeId,
    pub addr: VirtualAddr,
    pub ty: ScalarType,

    /// Enumerator names, empty for other types.
    pub labels: Vec<String>,

    /// Value from the ELF file.
    pub default: Option<Value>,

    /// Value from the image.
    pub value: Option<Value>,
}

impl Binding {
    /// True if the image's value differs from the ELF's.
    pub fn is_modified(&self) -> bool {
        match (&self.default, &self.value) {
            (Some(default), Some(value)) => default.encode() != value.encode(),
            _ => false,
        }
    }

    pub fn display_value(&self) -> String {
        match &self.value {
            Some(value) => value.display_with(&self.labels),
            None => "?".to_string(),
        }
    }
}

pub struct LoadedImage {
    pub name: String,
    image: Box<dyn MemoryImage>,
    bindings: Vec<Binding>,
}

impl LoadedImage {
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn image(&self) -> &dyn MemoryImage {
        self.image.as_ref()
    }
}

/// A multi-dimensional array. These are shown but not read or written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArrayInfo {
    pub node: NodeId,
    pub path: String,
    pub descriptor: String,
}

pub struct CalibrationSet<'a> {
    elf: &'a ElfFile,
    tree: &'a SymbolTree,
    selected: Option<NodeId>,

    /// Bindings for the selected subtree with defaults filled in but no values.
    template: Vec<Binding>,

    images: Vec<LoadedImage>,
    observers: Vec<Box<dyn CalibrationObserver + 'a>>,
}

impl<'a> CalibrationSet<'a> {
    pub fn new(elf: &'a ElfFile, tree: &'a SymbolTree) -> Self {
        CalibrationSet {
            elf,
            tree,
            selected: None,
            template: Vec::new(),
            images: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn CalibrationObserver + 'a>) {
        self.observers.push(observer);
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn images(&self) -> &[LoadedImage] {
        &self.images
    }

    /// Returns the new image's index. If a subtree is selected the image's values are
    /// read right away.
    pub fn attach_image(&mut self, name: &str, image: Box<dyn MemoryImage>) -> usize {
        let index = self.images.len();
        self.images.push(LoadedImage {
            name: name.to_string(),
            image,
            bindings: self.template.clone(),
        });
        info!("attached {name} as image {index}");
        if self.selected.is_some() {
            self.notify_reset(index);
            self.populate(index);
        }
        index
    }

    /// Later images move down one index.
    pub fn detach_image(&mut self, index: usize) -> Result<LoadedImage> {
        if index >= self.images.len() {
            return Err(CalibError::InvalidImageIndex(index));
        }
        let image = self.images.remove(index);
        info!("detached image {index} ({})", image.name);
        Ok(image)
    }

    /// Rebinds every image to the variables under node.
    pub fn select_subtree(&mut self, node: NodeId) -> Result<()> {
        if self.tree.get(node).is_none() {
            return Err(CalibError::InvalidSymbolIndex(node.0));
        }
        let mut leaves = Vec::new();
        let mut arrays = Vec::new();
        self.walk(node, &mut leaves, &mut arrays);

        self.template = leaves
            .into_iter()
            .filter_map(|id| self.make_binding(id))
            .collect();
        self.selected = Some(node);
        info!(
            "selected {} with {} values",
            self.tree.path(node),
            self.template.len()
        );

        for index in 0..self.images.len() {
            self.images[index].bindings = self.template.clone();
            self.notify_reset(index);
            self.populate(index);
        }
        Ok(())
    }

    /// Re-reads every value in the image. Values that can't be read become None.
    pub fn read_all(&mut self, image: usize) -> Result<()> {
        if image >= self.images.len() {
            return Err(CalibError::InvalidImageIndex(image));
        }
        self.populate(image);
        Ok(())
    }

    pub fn bindings(&self, image: usize) -> Result<&[Binding]> {
        self.images
            .get(image)
            .map(|i| i.bindings.as_slice())
            .ok_or(CalibError::InvalidImageIndex(image))
    }

    pub fn binding(&self, image: usize, symbol: usize) -> Result<&Binding> {
        self.bindings(image)?
            .get(symbol)
            .ok_or(CalibError::InvalidSymbolIndex(symbol))
    }

    pub fn value(&self, image: usize, symbol: usize) -> Result<Option<Value>> {
        Ok(self.binding(image, symbol)?.value)
    }

    /// Writes to one image. Other images are never touched.
    pub fn write(&mut self, image: usize, symbol: usize, value: Value) -> Result<()> {
        let loaded = self
            .images
            .get_mut(image)
            .ok_or(CalibError::InvalidImageIndex(image))?;
        let binding = loaded
            .bindings
            .get_mut(symbol)
            .ok_or(CalibError::InvalidSymbolIndex(symbol))?;
        if value.scalar_type() != binding.ty {
            return Err(CalibError::InvalidValue {
                text: value.to_string(),
                expected: binding.ty.to_string(),
            });
        }

        loaded.image.write_value(binding.addr.0, &value)?;
        binding.value = Some(value);
        for observer in self.observers.iter_mut() {
            observer.value_changed(image, symbol, Some(&value));
        }
        Ok(())
    }

    /// Parses text using the binding's type and then writes it.
    pub fn write_text(&mut self, image: usize, symbol: usize, text: &str) -> Result<()> {
        let binding = self.binding(image, symbol)?;
        let value = Value::parse(text, binding.ty, &binding.labels)?;
        self.write(image, symbol, value)
    }

    pub fn save_image(&self, image: usize, path: &Path) -> Result<()> {
        let loaded = self
            .images
            .get(image)
            .ok_or(CalibError::InvalidImageIndex(image))?;
        loaded.image.save(path)?;
        info!("saved image {image} to {}", path.display());
        Ok(())
    }

    /// Index of the binding for a node of the selected subtree. Arrays, structs and
    /// unknown types have no binding.
    pub fn find_binding(&self, image: usize, node: NodeId) -> Result<usize> {
        let bindings = self.bindings(image)?;
        if let Some(index) = bindings.iter().position(|b| b.node == node) {
            return Ok(index);
        }
        match self.tree.get(node) {
            Some(n) if n.is_multi_dimensional() => {
                let dims = dimension_descriptor(&n.dims).unwrap_or_default();
                Err(CalibError::NotValueAddressable(format!("{} {dims}", n.dtype)))
            }
            Some(n) if ScalarType::from_data_type(n.dtype).is_none() => {
                Err(CalibError::NotValueAddressable(n.dtype.to_string()))
            }
            _ => Err(CalibError::InvalidSymbolIndex(node.0)),
        }
    }

    /// The multi-dimensional arrays within the selected subtree.
    pub fn arrays(&self) -> Vec<ArrayInfo> {
        let Some(node) = self.selected else {
            return Vec::new();
        };
        let mut leaves = Vec::new();
        let mut arrays = Vec::new();
        self.walk(node, &mut leaves, &mut arrays);
        arrays
            .into_iter()
            .filter_map(|id| {
                let descriptor = dimension_descriptor(&self.tree[id].dims)?;
                Some(ArrayInfo {
                    node: id,
                    path: self.tree.path(id),
                    descriptor,
                })
            })
            .collect()
    }
}

impl<'a> CalibrationSet<'a> {
    /// Qualifiers are skipped but their children are visited. Multi-dimensional arrays
    /// are display only though their members are still visited. Enum children are
    /// labels, not variables.
    fn walk(&self, id: NodeId, leaves: &mut Vec<NodeId>, arrays: &mut Vec<NodeId>) {
        let node = &self.tree[id];
        if !node.qualifier {
            if node.is_multi_dimensional() {
                arrays.push(id);
            } else if ScalarType::from_data_type(node.dtype).is_some() {
                leaves.push(id);
            }
            if node.dtype == DataType::Enum {
                return;
            }
        }
        for &child in self.tree.children(id) {
            self.walk(child, leaves, arrays);
        }
    }

    fn make_binding(&self, id: NodeId) -> Option<Binding> {
        let node = &self.tree[id];
        let ty = ScalarType::from_data_type(node.dtype)?;
        let labels = if ty == ScalarType::Enum {
            self.tree.enum_labels(id)
        } else {
            Vec::new()
        };
        let default = match self
            .elf
            .read_bytes(node.addr, ty.width())
            .and_then(|bytes| decode(bytes, ty))
        {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("no default for {}: {err}", self.tree.path(id));
                None
            }
        };
        Some(Binding {
            node: id,
            addr: node.addr,
            ty,
            labels,
            default,
            value: None,
        })
    }

    fn populate(&mut self, index: usize) {
        let loaded = &mut self.images[index];
        for (symbol, binding) in loaded.bindings.iter_mut().enumerate() {
            binding.value = match loaded.image.read_value(binding.addr.0, binding.ty) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(
                        "couldn't read {} from {}: {err}",
                        self.tree.path(binding.node),
                        loaded.name
                    );
                    None
                }
            };
            for observer in self.observers.iter_mut() {
                observer.value_changed(index, symbol, binding.value.as_ref());
            }
        }
    }

    fn notify_reset(&mut self, index: usize) {
        for observer in self.observers.iter_mut() {
            observer.bindings_reset(index);
        }
    }
}
