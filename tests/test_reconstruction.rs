use pamlwick::model::TagValue;
use pamlwick::paml::PamlParserBuilder;
use pamlwick::parse_file;
use pamlwick::parser::ErrorKind;
use std::fs;
use std::path::Path;

fn codeml_dir() -> std::path::PathBuf {
    Path::new("tests").join("fixtures").join("codeml")
}

// --- TESTS CORRELATION WITH REPORT ---
#[test]
fn test_reconstruction_is_attached() {
    let results = parse_file(codeml_dir().join("mlc")).unwrap();
    let reconstruction = results[0].reconstruction().unwrap();

    assert_eq!(reconstruction.trees.len(), 1);
    let tree = &reconstruction.trees[0];
    assert!(tree.is_valid());
    let human = tree.find_by_label("human").unwrap();
    assert_eq!(tree[human].tags().get_f64("node_id"), Some(1.0));
    assert_eq!(tree[tree.root_index()].label(), Some("5"));

    let chimp = tree.find_by_label("chimp").unwrap();
    let changes = tree[chimp].tags().get_all("changes");
    assert_eq!(changes.len(), 1);
    let event = changes[0].as_change().unwrap();
    assert_eq!(event.site, 2);
    assert_eq!(event.ancestral, "GCC");
    assert_eq!(event.derived, "GCT");
    assert_eq!(event.ancestral_probability, 0.99);
    assert!(tree[human].tags().get_all("changes").is_empty());

    assert!(reconstruction.branch_changes["5..6"].is_empty());
    assert_eq!(reconstruction.branch_changes["5..3"][0].derived, "AAG");
    assert_eq!(reconstruction.branch_changes.len(), 5);
}

#[test]
fn test_site_probabilities() {
    let results = parse_file(codeml_dir().join("mlc")).unwrap();
    let reconstruction = results[0].reconstruction().unwrap();
    assert_eq!(reconstruction.site_probabilities.len(), 4);

    let site = reconstruction.site(2).unwrap();
    assert_eq!(site.frequency, 1);
    assert_eq!(site.extant.len(), 4);
    assert_eq!(site.extant[1].residue, "GCT");
    assert_eq!(site.extant[1].amino_acid.as_deref(), Some("A"));
    assert_eq!(site.ancestral.len(), 2);
    assert_eq!(site.ancestral[0].residue, "GCC");
    assert_eq!(site.ancestral[0].probability, 0.998);
    assert_eq!(site.ancestral[1].probability, 0.99);
    assert!(reconstruction.site(5).is_none());
}

#[test]
fn test_reconstructed_sequences_and_accuracy() {
    let results = parse_file(codeml_dir().join("mlc")).unwrap();
    let result = &results[0];
    let reconstruction = result.reconstruction().unwrap();

    let ids: Vec<&str> = reconstruction.sequences.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["human", "chimp", "gorilla", "orangutan", "node#5", "node#6"]);
    assert_eq!(reconstruction.sequences[4].residues, "ATGGCCAAACGT");
    assert_eq!(reconstruction.sequences[1].residues, "ATGGCTAAACGT");
    assert_eq!(
        reconstruction.sequences[4].description.as_deref(),
        Some("overall_accuracy_site=0.9995 overall_accuracy_seq=0.998")
    );
    assert_eq!(
        reconstruction.sequences[5].description.as_deref(),
        Some("overall_accuracy_site=0.99675 overall_accuracy_seq=0.987")
    );
    assert_eq!(reconstruction.sequences[0].description, None);
    assert!(result.warnings().is_empty(), "{:?}", result.warnings());
}

// --- TESTS MISSING OR DISABLED RECONSTRUCTION ---
#[test]
fn test_without_reconstruction() {
    let results = PamlParserBuilder::for_file(codeml_dir().join("mlc"))
        .unwrap()
        .without_reconstruction()
        .build()
        .unwrap()
        .into_results()
        .unwrap();
    assert!(results[0].reconstruction().is_none());
    assert_eq!(results[0].trees().len(), 1);
}

#[test]
fn test_missing_reconstruction_file() {
    let results = PamlParserBuilder::for_file(codeml_dir().join("mlc"))
        .unwrap()
        .with_reconstruction_file("rst-missing")
        .build()
        .unwrap()
        .into_results()
        .unwrap();
    assert!(results[0].reconstruction().is_none());
    assert!(results[0].warnings().is_empty());
}

#[test]
fn test_report_without_neighbouring_rst() {
    let results = parse_file(Path::new("tests").join("fixtures").join("baseml").join("mlb")).unwrap();
    assert!(results[0].reconstruction().is_none());
}

// --- TESTS STANDALONE STREAM ---
#[test]
fn test_standalone_parse() {
    let text = fs::read_to_string(codeml_dir().join("rst")).unwrap();
    let (reconstruction, warnings) = pamlwick::rst::parse_str(&text).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(reconstruction.sequences.len(), 6);
    assert_eq!(reconstruction.trees[0].num_leaves(), 4);
}

#[test]
fn test_unresolved_branch_is_warning() {
    let text = "tree with node labels for Rod Page's TreeView\n\
                ((1_a, 2_b) 4 , 3_c) 5 ;\n\n\
                Summary of changes along branches.\n\n\
                Branch 1:    5..9  \n\n    2 A 0.990 -> V\n";
    let (reconstruction, warnings) = pamlwick::rst::parse_str(text).unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0].kind(), ErrorKind::CorrelationMiss(_)));
    assert!(!warnings[0].is_fatal());
    assert_eq!(reconstruction.branch_changes["5..9"].len(), 1);

    let tree = &reconstruction.trees[0];
    let tagged = tree
        .vertices()
        .iter()
        .flat_map(|v| v.tags().get_all("changes"))
        .filter(|t| matches!(t, TagValue::Change(_)))
        .count();
    assert_eq!(tagged, 0);
}
