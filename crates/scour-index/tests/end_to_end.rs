//! Indexing files from disk and searching them with loaded configuration.

// Integration tests live outside cfg(test)
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::PathBuf};

use scour_analysis::Field;
use scour_config::Config;
use scour_index::{FileMetadata, IndexContext, IndexLocation, Indexer, Searcher};
use scour_query::SearchQuery;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn metadata(&self, relative: &str, project: &str) -> FileMetadata {
        let path = self.dir.path().join(relative);
        FileMetadata::new(path.to_string_lossy(), project, 1_700_000_000_000)
    }
}

#[test]
fn index_and_search_from_disk() {
    let ws = Workspace::new();
    ws.write(
        ".scour.toml",
        "root = true\n\n[search]\nshow_match_counts = true\n\n[working_sets]\nlibs = [\"util\"]\n",
    );
    let files = [
        ("core/src/XmlParser.java", "core", "class XmlParser { Node parseXml() {} }"),
        ("core/src/Main.java", "core", "class Main { void run() { parseXml(); } }"),
        ("util/src/Strings.java", "util", "class Strings { String trim() {} }"),
    ];
    let batch: Vec<_> = files
        .iter()
        .map(|(relative, project, contents)| {
            (ws.write(relative, contents), ws.metadata(relative, project))
        })
        .collect();

    let config = Config::load(ws.dir.path()).unwrap();
    let location = IndexLocation::on_disk(ws.dir.path().join(".index"));
    let context = IndexContext::new(&config.analysis);
    let indexer = Indexer::new(location.clone(), context.clone(), config.index.clone()).unwrap();

    let stats = indexer.index_batch(batch);
    assert!(stats.is_success());
    assert_eq!(stats.indexed, 3);
    assert!(indexer.is_indexed().unwrap());

    let mut searcher = Searcher::new(location, context, indexer.generation(), config.search)
        .with_working_sets(config.working_sets);

    let result = searcher
        .search(&mut SearchQuery::new("parseXml"))
        .unwrap()
        .unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|doc| doc.match_count().is_some_and(|n| n > 0)));
    assert!(result.iter().all(|doc| doc.extension() == Some("java")));

    let result = searcher
        .search(&mut SearchQuery::new("class ws:libs"))
        .unwrap()
        .unwrap();
    let names: Vec<_> = result.iter().map(|doc| doc.file_name()).collect();
    assert_eq!(names, ["Strings.java"]);

    let projects: Vec<_> = searcher.index_projects().unwrap().into_iter().collect();
    assert_eq!(projects, ["core", "util"]);
    let extensions: Vec<_> = searcher.proposals("ja", Field::Ext).unwrap().into_iter().collect();
    assert_eq!(extensions, ["java"]);
}

#[test]
fn deleted_index_is_rebuilt_from_scratch() {
    let ws = Workspace::new();
    let path = ws.write("core/a.txt", "alpha beta");
    let location = IndexLocation::on_disk(ws.dir.path().join(".index"));
    let context = IndexContext::default();
    let indexer =
        Indexer::new(location.clone(), context.clone(), Default::default()).unwrap();
    indexer
        .index_file_with_retry(path.as_path(), &ws.metadata("core/a.txt", "core"))
        .unwrap();

    let mut searcher = Searcher::new(
        location,
        context,
        indexer.generation(),
        Default::default(),
    );
    assert_eq!(searcher.num_docs().unwrap(), 1);

    indexer.delete_index().unwrap();
    searcher.on_index_reset();
    assert!(!indexer.is_indexed().unwrap());

    indexer
        .index_file_with_retry("gamma", &ws.metadata("core/b.txt", "core"))
        .unwrap();
    searcher.on_index_update();
    let result = searcher
        .search(&mut SearchQuery::new("gamma"))
        .unwrap()
        .unwrap();
    assert_eq!(result.len(), 1);
    assert!(
        searcher
            .search(&mut SearchQuery::new("alpha"))
            .unwrap()
            .is_none()
    );
}
