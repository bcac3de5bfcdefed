use camino::Utf8PathBuf;
use vendorize::{CompressOptions, Compressor, Error, PrefixTable, ResolvedConfig, default_table};

struct Site {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Site {
    fn new(files: &[(&str, &[u8])]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        for (name, content) in files {
            let path = root.join(name);
            fs_err::create_dir_all(path.parent().unwrap()).unwrap();
            fs_err::write(&path, content).unwrap();
        }
        Self { _dir: dir, root }
    }

    fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    fn compressor(&self, options: CompressOptions) -> Compressor {
        Compressor::new(default_table().clone(), options).unwrap()
    }
}

fn uncached() -> CompressOptions {
    CompressOptions::default()
}

#[test_log::test]
fn compress_file_runs_every_stage() {
    let site = Site::new(&[
        ("css/base.css", b".base { opacity: 0.5; }"),
        ("img/dot.gif", b"GIF"),
        (
            "css/site.css",
            b"@import url(\"base.css\");\n.hero {\n  background: url(../img/dot.gif) no-repeat;\n  color: #ffffff;\n}\n",
        ),
    ]);

    let out = site
        .compressor(uncached())
        .compress_file(&site.path("css/site.css"))
        .unwrap();

    assert_eq!(
        out.css,
        ".base{-khtml-opacity:.5;-moz-opacity:.5;opacity:.5;}\
         .hero{background:url(data:image/gif;base64,R0lG) no-repeat;color:#fff;}"
    );
    assert!(!out.cache_hit);
}

#[test_log::test]
fn keyframes_and_placeholder_survive_minification() {
    let site = Site::new(&[(
        "a.css",
        b"@keyframes spin { 0% { top: 0; } 100% { top: 10px; } }\n::placeholder { color: gray; }\n",
    )]);
    let out = site
        .compressor(uncached())
        .compress_file(&site.path("a.css"))
        .unwrap();

    for prefix in ["-webkit-", "-moz-", "-o-", ""] {
        assert!(
            out.css
                .contains(&format!("@{prefix}keyframes spin{{0%{{top:0;}} 100%{{top:10px;}} }}")),
            "missing {prefix:?} block in {}",
            out.css
        );
    }
    assert!(out.css.contains("::-webkit-input-placeholder{color:gray;}"));
    assert!(out.css.contains("::-ms-input-placeholder{color:gray;}"));
}

#[test_log::test]
fn second_run_hits_the_cache() {
    let site = Site::new(&[("a.css", b".a { opacity: 1; }")]);
    let options = CompressOptions {
        cache_dir: Some(site.path(".cache")),
        ..CompressOptions::default()
    };
    let compressor = site.compressor(options);

    let first = compressor.compress_file(&site.path("a.css")).unwrap();
    let second = compressor.compress_file(&site.path("a.css")).unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.css, second.css);
    assert_eq!(fs_err::read_dir(site.path(".cache")).unwrap().count(), 1);
}

#[test_log::test]
fn cache_tracks_imported_content() {
    let site = Site::new(&[
        ("part.css", b".p { opacity: 1; }"),
        ("a.css", b"@import url(part.css);"),
    ]);
    let options = CompressOptions {
        cache_dir: Some(site.path(".cache")),
        ..CompressOptions::default()
    };
    let compressor = site.compressor(options);

    compressor.compress_file(&site.path("a.css")).unwrap();
    fs_err::write(site.path("part.css"), ".p { opacity: 0; }").unwrap();
    let out = compressor.compress_file(&site.path("a.css")).unwrap();

    assert!(!out.cache_hit);
    assert!(out.css.contains("-moz-opacity:0;"));
}

#[test_log::test]
fn cache_tracks_the_table() {
    let site = Site::new(&[("a.css", b".a { opacity: 1; }")]);
    let cache_dir = site.path(".cache");
    let options = CompressOptions {
        cache_dir: Some(cache_dir.clone()),
        ..CompressOptions::default()
    };

    site.compressor(options.clone())
        .compress_file(&site.path("a.css"))
        .unwrap();

    let table = PrefixTable::from_pairs([("opacity", &["-webkit-", ""][..])]).unwrap();
    let out = Compressor::new(table, options)
        .unwrap()
        .compress_file(&site.path("a.css"))
        .unwrap();

    assert!(!out.cache_hit);
    assert_eq!(out.css, ".a{-webkit-opacity:1;opacity:1;}");
}

#[test_log::test]
fn stages_can_be_disabled() {
    let site = Site::new(&[
        ("a.css", b"@import url(missing.css);\n.a { background: url(missing.png); }"),
    ]);
    let options = CompressOptions {
        minify: false,
        inline_imports: false,
        embed_images: false,
        cache_dir: None,
    };
    let out = site
        .compressor(options)
        .compress_file(&site.path("a.css"))
        .unwrap();
    assert_eq!(
        out.css,
        "@import url(missing.css);\n.a { background: url(missing.png); }"
    );
}

#[test_log::test]
fn missing_input_is_an_io_error() {
    let site = Site::new(&[]);
    let err = site
        .compressor(uncached())
        .compress_file(&site.path("nope.css"))
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test_log::test]
fn missing_image_is_an_asset_error() {
    let site = Site::new(&[("a.css", b".a { background: url(gone.png); }")]);
    let err = site
        .compressor(uncached())
        .compress_file(&site.path("a.css"))
        .unwrap_err();
    assert!(matches!(err, Error::Asset { .. }));
}

#[test_log::test]
fn commented_out_assets_are_not_fetched() {
    let site = Site::new(&[
        ("part.css", b"/* .p { background: url(lost.png); } */\n.p { top: 0; }"),
        (
            "a.css",
            b"@import url(part.css);\n/* @import url(old.css); */\n\
              /* .old { background: url(gone.png); } */\n.a { color: red; }",
        ),
    ]);
    let options = CompressOptions {
        minify: false,
        ..CompressOptions::default()
    };

    let out = site
        .compressor(options)
        .compress_file(&site.path("a.css"))
        .unwrap();

    assert!(out.css.contains(".p { top: 0; }"));
    assert!(out.css.contains(".a { color: red; }"));
    for gone in ["old.css", "gone.png", "lost.png", "/*"] {
        assert!(!out.css.contains(gone), "{gone} left in {}", out.css);
    }
}

#[test_log::test]
fn compressor_from_discovered_config() {
    let site = Site::new(&[
        (
            ".config/vendorize.yaml",
            b"minify: false\ncache_dir: build/cache\nprefixes:\n  replace_defaults: true\n  entries:\n    - name: opacity\n      prefixes: [\"-moz-\", \"\"]\n",
        ),
        ("style.css", b".a { opacity: 1; transform: none; }"),
    ]);

    let config = ResolvedConfig::discover_from(&site.root).unwrap().unwrap();
    assert_eq!(config.cache_dir, site.path("build/cache"));

    let out = Compressor::from_config(&config)
        .unwrap()
        .compress_file(&site.path("style.css"))
        .unwrap();
    assert_eq!(out.css, ".a { -moz-opacity: 1;opacity: 1; transform: none; }");
    assert!(site.path("build/cache").is_dir());
}
