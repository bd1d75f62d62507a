//! Name-keyed collection of histograms.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::{Path, PathBuf};

use hm_root::{
    Axis, AxisSpec, BinStore, Hist1D, Hist2D, HistObject, Key, Profile, RootError, RootFile,
    RootWriter, WriteOptions,
};

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::weight::resolve_weight;

/// Maps names to histograms and forwards fill/set/add calls to them.
///
/// Entries are kept in lexicographic name order, which is also the order
/// [`save`](Self::save) writes them in. Bin indices follow the ROOT
/// convention: `0` is the underflow, `1..=n` the in-range bins and `n + 1`
/// the overflow.
#[derive(Debug, Clone, Default)]
pub struct HistManager {
    data: BTreeMap<String, HistObject>,
    default_weight: Option<f64>,
    source_path: Option<PathBuf>,
    write_options: WriteOptions,
}

impl HistManager {
    /// Empty manager with no default weight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager holding every top-level histogram of the container at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut mgr = Self::new();
        mgr.load(path, None)?;
        Ok(mgr)
    }

    /// Manager with the default weight, write options and histograms of `config`.
    pub fn with_config(config: ManagerConfig) -> Result<Self> {
        let mut mgr = Self {
            default_weight: config.default_weight,
            write_options: config.write,
            ..Self::default()
        };
        for (name, decl) in &config.histograms {
            mgr.data.insert(name.clone(), decl.build(name)?);
        }
        Ok(mgr)
    }

    // ---- creation ----

    /// Register a 1-D histogram with `bin_count` uniform bins over `[min, max)`.
    ///
    /// An existing entry with the same name is replaced.
    pub fn create_1d(&mut self, name: &str, bin_count: usize, min: f64, max: f64) -> Result<()> {
        let axis = Axis::uniform(bin_count, min, max)?;
        self.replace(name, Hist1D::new(name, name, axis).into());
        Ok(())
    }

    /// Register a 1-D histogram with explicit bin edges.
    pub fn create_1d_variable(&mut self, name: &str, edges: impl Into<Vec<f64>>) -> Result<()> {
        let axis = Axis::variable(edges.into())?;
        self.replace(name, Hist1D::new(name, name, axis).into());
        Ok(())
    }

    /// Register a 2-D histogram; each axis is uniform or variable.
    ///
    /// ```
    /// # use histmgr::HistManager;
    /// let mut m = HistManager::new();
    /// m.create_2d("a", (5, 0.0, 5.0), (5, 0.0, 5.0)).unwrap();
    /// m.create_2d("b", vec![0.0, 1.0, 4.0], (3, -1.0, 1.0)).unwrap();
    /// ```
    pub fn create_2d(
        &mut self,
        name: &str,
        x: impl Into<AxisSpec>,
        y: impl Into<AxisSpec>,
    ) -> Result<()> {
        let x = x.into().to_axis()?;
        let y = y.into().to_axis()?;
        self.replace(name, Hist2D::new(name, name, x, y)?.into());
        Ok(())
    }

    /// Register a profile over `[x_min, x_max)`. Fills with `y` outside
    /// `[y_min, y_max]` are dropped unless `y_min == y_max`.
    pub fn create_profile(
        &mut self,
        name: &str,
        bin_count: usize,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Result<()> {
        let axis = Axis::uniform(bin_count, x_min, x_max)?;
        self.replace(name, Profile::new(name, name, axis, y_min, y_max)?.into());
        Ok(())
    }

    fn replace(&mut self, name: &str, obj: HistObject) {
        if self.data.insert(name.to_string(), obj).is_some() {
            log::debug!("replaced histogram '{name}'");
        }
    }

    // ---- default weight ----

    /// Weight used by later fills and increments that omit one.
    pub fn set_default_weight(&mut self, w: f64) {
        self.default_weight = Some(w);
    }

    /// Go back to unit weight for calls that omit one.
    pub fn clear_default_weight(&mut self) {
        self.default_weight = None;
    }

    /// Current default weight, if set.
    pub fn default_weight(&self) -> Option<f64> {
        self.default_weight
    }

    // ---- fill / set / add ----

    /// Fill a 1-D histogram.
    pub fn fill_1d(&mut self, name: &str, value: f64, weight: Option<f64>) -> Result<()> {
        let w = resolve_weight(weight, self.default_weight);
        self.get_mut(name)?.fill_1d(value, w)?;
        Ok(())
    }

    /// Fill a 2-D histogram.
    pub fn fill_2d(&mut self, name: &str, x: f64, y: f64, weight: Option<f64>) -> Result<()> {
        let w = resolve_weight(weight, self.default_weight);
        self.get_mut(name)?.fill_2d(x, y, w)?;
        Ok(())
    }

    /// Fill a profile with dependent value `y` at `x`.
    pub fn fill_profile(&mut self, name: &str, x: f64, y: f64, weight: Option<f64>) -> Result<()> {
        let w = resolve_weight(weight, self.default_weight);
        self.get_mut(name)?.fill_profile(x, y, w)?;
        Ok(())
    }

    /// Overwrite the content of `bin`.
    pub fn set_bin_content(&mut self, name: &str, bin: usize, value: f64) -> Result<()> {
        self.get_mut(name)?.set_bin_content(bin, value)?;
        Ok(())
    }

    /// Overwrite the content of 2-D cell `(i, j)`.
    pub fn set_bin_content_2d(&mut self, name: &str, i: usize, j: usize, value: f64) -> Result<()> {
        self.get_mut(name)?.set_bin_content_2d(i, j, value)?;
        Ok(())
    }

    /// Overwrite the uncertainty of `bin`.
    pub fn set_bin_error(&mut self, name: &str, bin: usize, error: f64) -> Result<()> {
        self.get_mut(name)?.set_bin_error(bin, error)?;
        Ok(())
    }

    /// Overwrite the uncertainty of 2-D cell `(i, j)`.
    pub fn set_bin_error_2d(&mut self, name: &str, i: usize, j: usize, error: f64) -> Result<()> {
        self.get_mut(name)?.set_bin_error_2d(i, j, error)?;
        Ok(())
    }

    /// Add the resolved weight to the content of `bin`.
    pub fn add_bin_content(&mut self, name: &str, bin: usize, weight: Option<f64>) -> Result<()> {
        let w = resolve_weight(weight, self.default_weight);
        self.get_mut(name)?.add_bin_content(bin, w)?;
        Ok(())
    }

    // ---- persistence ----

    /// Options `save` writes with.
    pub fn write_options(&self) -> WriteOptions {
        self.write_options
    }

    /// Change the options `save` writes with.
    pub fn set_write_options(&mut self, options: WriteOptions) {
        self.write_options = options;
    }

    /// Path of the last container loaded or saved.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Write every entry, in name order, to a new container at `path`.
    ///
    /// Missing parent directories are created and an existing file is
    /// replaced. Each entry is stored under its collection name.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = RootWriter::new(self.write_options);
        for (name, obj) in &self.data {
            writer.root().put_named(name, obj)?;
        }
        writer.write(path)?;

        log::info!("saved {} histograms to {}", self.data.len(), path.display());
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Import histograms from the container at `path`.
    ///
    /// Without `folder`, every top-level leaf record is imported and
    /// sub-directories are skipped. With `folder`, only the leaf records
    /// directly inside the top-level sub-directory of that name are
    /// imported; deeper directories are not searched. Entries are stored
    /// under their record names, replacing existing ones.
    ///
    /// Records whose class is not a histogram kind are skipped. Returns the
    /// number of imported entries.
    pub fn load(&mut self, path: impl AsRef<Path>, folder: Option<&str>) -> Result<usize> {
        let path = path.as_ref();
        let file = RootFile::open(path)?;
        let top = file.top_directory()?;
        let (leaves, dirs) = top.partition();

        let imported = match folder {
            None => {
                for dir in &dirs {
                    log::debug!("skipping folder '{}'", dir.name);
                }
                self.import_leaves(&file, &leaves)?
            }
            Some(folder) => {
                let mut imported = 0;
                let mut found = false;
                for dir in dirs.iter().filter(|d| d.name == folder) {
                    found = true;
                    let sub = file.read_subdirectory(dir)?;
                    let (sub_leaves, nested) = sub.partition();
                    for n in &nested {
                        log::debug!("skipping nested folder '{folder}/{}'", n.name);
                    }
                    imported += self.import_leaves(&file, &sub_leaves)?;
                }
                if !found {
                    log::warn!("folder '{folder}' not found in {}", path.display());
                }
                imported
            }
        };

        log::info!("loaded {imported} histograms from {}", path.display());
        self.source_path = Some(path.to_path_buf());
        Ok(imported)
    }

    fn import_leaves(&mut self, file: &RootFile, keys: &[&Key]) -> Result<usize> {
        let mut imported = 0;
        for key in keys {
            match file.read_object(key) {
                Ok(obj) => {
                    self.data.insert(key.name.clone(), obj);
                    imported += 1;
                }
                // Known leniency: records that cannot become an owned histogram are left behind.
                Err(RootError::UnsupportedClass(class)) => {
                    log::debug!("skipping '{}': cannot import class {class}", key.name);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(imported)
    }

    /// Insert every `(name, object)` pair, replacing entries with the same name.
    pub fn import_from_mapping<I>(&mut self, mapping: I)
    where
        I: IntoIterator<Item = (String, HistObject)>,
    {
        self.data.extend(mapping);
    }

    // ---- accessors ----

    /// The object registered under `name`.
    pub fn get(&self, name: &str) -> Result<&HistObject> {
        self.data.get(name).ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    /// Mutable access to the object registered under `name`.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut HistObject> {
        self.data.get_mut(name).ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    /// The 1-D histogram registered under `name`.
    pub fn get_1d(&self, name: &str) -> Result<&Hist1D> {
        let obj = self.get(name)?;
        obj.as_1d().ok_or_else(|| kind_mismatch(name, obj, "a 1-D histogram"))
    }

    /// The 2-D histogram registered under `name`.
    pub fn get_2d(&self, name: &str) -> Result<&Hist2D> {
        let obj = self.get(name)?;
        obj.as_2d().ok_or_else(|| kind_mismatch(name, obj, "a 2-D histogram"))
    }

    /// The profile registered under `name`.
    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        let obj = self.get(name)?;
        obj.as_profile().ok_or_else(|| kind_mismatch(name, obj, "a profile"))
    }

    /// Store `obj` under `name`, returning the object it replaces.
    pub fn insert(&mut self, name: impl Into<String>, obj: impl Into<HistObject>) -> Option<HistObject> {
        self.data.insert(name.into(), obj.into())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// `(name, object)` pairs in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, HistObject> {
        self.data.iter()
    }

    /// Registered names in order.
    pub fn names(&self) -> btree_map::Keys<'_, String, HistObject> {
        self.data.keys()
    }

    /// Objects in name order.
    pub fn values(&self) -> btree_map::Values<'_, String, HistObject> {
        self.data.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn kind_mismatch(name: &str, obj: &HistObject, wanted: &str) -> Error {
    Error::Root(RootError::TypeMismatch(format!(
        "'{name}' is a {}, not {wanted}",
        obj.class_name()
    )))
}

impl<'a> IntoIterator for &'a HistManager {
    type Item = (&'a String, &'a HistObject);
    type IntoIter = btree_map::Iter<'a, String, HistObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl Extend<(String, HistObject)> for HistManager {
    fn extend<I: IntoIterator<Item = (String, HistObject)>>(&mut self, iter: I) {
        self.import_from_mapping(iter);
    }
}
