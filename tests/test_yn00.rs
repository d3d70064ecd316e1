use pamlwick::model::Dialect;
use pamlwick::parse_file;
use std::path::Path;

#[test]
fn test_pairwise_distance_report() {
    let path = Path::new("tests").join("fixtures").join("yn00").join("yn");
    let results = parse_file(path).unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];

    assert_eq!(result.dialect(), Dialect::PairwiseDistance);
    assert_eq!(result.summary().input_file.as_deref(), Some("hominoids.nuc"));
    assert_eq!(result.summary().version, None);
    assert_eq!(result.sequence("chimp").unwrap().residues, "ATGGCT");
    assert_eq!(result.sequence("gorilla").unwrap().residues, "ATAGCC");
    assert!(result.trees().is_empty());
    assert!(result.warnings().is_empty(), "{:?}", result.warnings());

    // Nei & Gojobori block behind the citation notes
    let ng = result.ng_matrix().unwrap();
    assert_eq!(ng.size(), 3);
    assert_eq!(ng.value(2, 1, "dS"), Some(0.3333));
    assert_eq!(ng.value(2, 0, "dN"), Some(0.2));

    // Yang & Nielsen rows are given as 1-based index pairs
    let yn = result.yn_matrix().unwrap();
    assert_eq!(yn.method(), "YN00");
    assert_eq!(yn.names(), ["human", "chimp", "gorilla"]);
    assert_eq!(yn.num_defined(), 3);
    assert_eq!(yn.value(1, 0, "dS"), Some(0.8));
    assert_eq!(yn.value(1, 0, "dS_SE"), Some(0.9));
    assert_eq!(yn.value(2, 0, "omega"), Some(99.0));
    assert_eq!(yn.value(2, 1, "t"), Some(0.6));
    assert_eq!(yn.value(2, 1, "N"), Some(4.5));
    assert!(yn.get(0, 2).is_none());
}
