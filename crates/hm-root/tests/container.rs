//! Integration tests: write containers to disk and read them back.

use approx::assert_relative_eq;
use hm_root::{
    Algorithm, Axis, BinStore, Compression, Hist1D, Hist2D, HistObject, Profile, RootError,
    RootFile, RootWriter, WriteOptions,
};

fn sample_objects() -> Vec<HistObject> {
    let mut h1 = Hist1D::new("pt", "p_{T}", Axis::uniform(100, 0.0, 500.0).unwrap());
    for i in 0..2000 {
        h1.fill((i % 480) as f64 + 0.25, 0.5 + (i % 3) as f64);
    }

    let mut h2 = Hist2D::new(
        "eta_phi",
        "occupancy",
        Axis::uniform(20, -2.5, 2.5).unwrap(),
        Axis::variable(vec![-3.2, -1.6, 0.0, 1.6, 3.2]).unwrap(),
    )
    .unwrap();
    for i in 0..500 {
        let t = i as f64 / 500.0;
        h2.fill(5.0 * t - 2.5, 6.4 * t - 3.2, 1.0);
    }

    let mut p = Profile::new("resp", "response", Axis::uniform(10, 0.0, 100.0).unwrap(), 0.0, 0.0)
        .unwrap();
    for i in 0..300 {
        p.fill((i % 100) as f64, 0.9 + 0.001 * i as f64, 1.0);
    }

    vec![h1.into(), h2.into(), p.into()]
}

fn assert_same_bins(a: &HistObject, b: &HistObject) {
    assert_eq!(a.name(), b.name());
    assert_eq!(a.class_name(), b.class_name());
    assert_eq!(a.n_cells(), b.n_cells());
    for bin in 0..a.n_cells() {
        assert_relative_eq!(a.bin_content(bin).unwrap(), b.bin_content(bin).unwrap());
        assert_relative_eq!(a.bin_error(bin).unwrap(), b.bin_error(bin).unwrap());
    }
}

#[test]
fn round_trip_through_disk_for_every_algorithm() {
    let dir = tempfile::tempdir().unwrap();
    for algorithm in [Algorithm::None, Algorithm::Zlib, Algorithm::Lz4, Algorithm::Zstd, Algorithm::Xz]
    {
        let compression = Compression::new(algorithm, if algorithm == Algorithm::None { 0 } else { 4 });
        let mut w = RootWriter::new(WriteOptions { compression });
        let objects = sample_objects();
        for obj in &objects {
            w.put(obj).unwrap();
        }
        let path = dir.path().join(format!("{algorithm:?}.hmrt"));
        w.write(&path).unwrap();

        let f = RootFile::open(&path).unwrap();
        assert_eq!(f.compression(), compression);
        assert_eq!(f.path(), Some(path.as_path()));
        for obj in &objects {
            let back = f.get_object(obj.name()).unwrap();
            assert_same_bins(obj, &back);
            assert_eq!(&back, obj, "{algorithm:?}: {}", obj.name());
        }
    }
}

#[test]
fn compression_shrinks_regular_payloads() {
    let mut plain = RootWriter::new(WriteOptions { compression: Compression::NONE });
    let mut packed = RootWriter::new(WriteOptions { compression: Compression::new(Algorithm::Zlib, 6) });
    let h = Hist1D::new("empty", "", Axis::uniform(5000, 0.0, 1.0).unwrap());
    plain.put(&h.clone().into()).unwrap();
    packed.put(&h.into()).unwrap();
    assert!(packed.to_bytes().unwrap().len() < plain.to_bytes().unwrap().len() / 10);
}

#[test]
fn keys_keep_insertion_order_and_folders_nest() {
    let mut w = RootWriter::default();
    let objects = sample_objects();
    w.put(&objects[2]).unwrap();
    w.put(&objects[0]).unwrap();
    let sel = w.mkdir("selection");
    sel.put(&objects[1]).unwrap();
    sel.mkdir("nested").put(&objects[0]).unwrap();

    let f = RootFile::from_bytes(w.to_bytes().unwrap()).unwrap();
    let keys = f.list_keys().unwrap();
    let listing: Vec<_> = keys.iter().map(|k| (k.name.as_str(), k.class_name.as_str())).collect();
    assert_eq!(listing, [("resp", "TProfile"), ("pt", "TH1D"), ("selection", "TDirectoryFile")]);
    assert!(keys.iter().all(|k| k.cycle == 1 && k.written.is_some()));

    let top = f.top_directory().unwrap();
    let (leaves, dirs) = top.partition();
    assert_eq!(leaves.len(), 2);
    assert_eq!(dirs.len(), 1);

    let sub = f.read_subdirectory(dirs[0]).unwrap();
    let (sub_leaves, sub_dirs) = sub.partition();
    assert_eq!(sub_leaves.len(), 1);
    assert_eq!(sub_leaves[0].name, "eta_phi");
    assert_eq!(sub_dirs[0].name, "nested");
    assert_same_bins(&f.read_object(sub_leaves[0]).unwrap(), &objects[1]);
    assert_same_bins(&f.get_object("selection/nested/pt").unwrap(), &objects[0]);
}

#[test]
fn unknown_class_is_reported_not_decoded() {
    let mut w = RootWriter::default();
    w.root().put_record("TGraph", "g", "a graph", vec![1, 2, 3, 4]);
    let f = RootFile::from_bytes(w.to_bytes().unwrap()).unwrap();
    assert!(matches!(f.get_object("g"), Err(RootError::UnsupportedClass(c)) if c == "TGraph"));
}

#[test]
fn leaf_is_not_a_directory() {
    let mut w = RootWriter::default();
    w.put(&sample_objects()[0]).unwrap();
    let f = RootFile::from_bytes(w.to_bytes().unwrap()).unwrap();
    let top = f.top_directory().unwrap();
    let key = top.find_key("pt").unwrap();
    assert!(matches!(f.read_subdirectory(key), Err(RootError::TypeMismatch(_))));
    assert!(matches!(f.get_object("pt/inner"), Err(RootError::TypeMismatch(_))));
}

#[test]
fn overwrite_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sub/out.hmrt");
    let objects = sample_objects();

    let mut first = RootWriter::default();
    first.put(&objects[0]).unwrap();
    first.put(&objects[1]).unwrap();
    first.write(&path).unwrap();

    let mut second = RootWriter::default();
    second.put(&objects[2]).unwrap();
    second.write(&path).unwrap();

    let f = RootFile::open(&path).unwrap();
    let names: Vec<_> = f.list_keys().unwrap().into_iter().map(|k| k.name).collect();
    assert_eq!(names, ["resp"]);
    let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
    assert_eq!(leftovers, 1, "temporary file left behind");
}

#[test]
fn corrupted_payload_fails_to_decode() {
    let mut w = RootWriter::new(WriteOptions { compression: Compression::NONE });
    w.put(&sample_objects()[0]).unwrap();
    let mut bytes = w.to_bytes().unwrap();
    let f = RootFile::from_bytes(bytes.clone()).unwrap();
    let key = f.top_directory().unwrap().find_key("pt").unwrap().clone();
    // clobber the byte count of the outer TH1D header
    let at = key.seek_key as usize + key.key_len as usize;
    bytes[at..at + 4].copy_from_slice(&0x4000_0002u32.to_be_bytes());
    let f = RootFile::from_bytes(bytes).unwrap();
    assert!(f.read_object(&key).is_err());
}

#[test]
fn write_options_from_json() {
    let opts: WriteOptions =
        serde_json::from_str(r#"{"compression": {"algorithm": "zstd", "level": 3}}"#).unwrap();
    assert_eq!(opts.compression, Compression::new(Algorithm::Zstd, 3));
    assert_eq!(opts.compression.setting(), 503);

    let defaults: WriteOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, WriteOptions::default());
}
