use pamlwick::model::{Dialect, ShapeParams};
use pamlwick::paml::PamlParser;
use pamlwick::parse_str;
use pamlwick::parser::ErrorKind;

const PAIRWISE: &str = "\
CODONML (in paml version 4.9, March 2015)  pair.nuc   Model: One dN/dS ratio
Codon frequency model: F3x4
ns =   2  ls =   3

human      ATG GCC AAA
chimp      ... ..T ...

pairwise comparison, codon frequencies: F3x4.


2 (chimp) ... 1 (human)
lnL = -20.123456
  0.01000  2.00000  0.50000

t= 0.0100  S=     2.5  N=     6.5  dN/dS=  0.5000  dN = 0.0030  dS = 0.0060
";

const TWO_DATA_SETS: &str = "\
BASEML (in paml version 4.9, March 2015)  two.nuc  JC69

Data set 1

ns =   2  ls =   4

a   ACGT
b   ...A

TREE #  1:  (1, 2);   MP score: 1
lnL(ntime:  1  np:  1):    -10.000000      +0.000000

(a: 0.10000, b: 0.20000);

Data set 2

ns =   2  ls =   4

a   TTTT
b   ...A

TREE #  1:  (1, 2);   MP score: 1
lnL(ntime:  1  np:  1):    -12.000000      +0.000000

(a: 0.30000, b: 0.40000);
";

const SITE_MODELS: &str = "\
CODONML (in paml version 4.9, March 2015)  three.nuc   Model: several dN/dS ratios for sites
ns =   3  ls =   2

human      ATG GCC
chimp      ... ..T
gorilla    ... ..A

Model 0: one-ratio

TREE #  1:  (1, 2, 3);   MP score: 2
lnL(ntime:  3  np:  5):    -20.000000      +0.000000
   4..1     4..2     4..3
  0.1 0.2 0.3 2.0 0.4

(human: 0.1, chimp: 0.2, gorilla: 0.3);

Detailed output identifying parameters

kappa (ts/tv) =  2.00000

omega (dN/dS) =  0.40000

Time used:  0:01

Model 2: PositiveSelection (3 categories)

TREE #  1:  (1, 2, 3);   MP score: 2
lnL(ntime:  3  np:  7):    -18.500000      +0.000000
   4..1     4..2     4..3
  0.1 0.2 0.3 2.0 0.8 0.1 5.0

(human: 0.1, chimp: 0.2, gorilla: 0.3);

Detailed output identifying parameters

kappa (ts/tv) =  2.10000

p:   0.80000  0.10000  0.10000
w:   0.05000  1.00000  5.00000

Naive Empirical Bayes (NEB) analysis
Positively selected sites (*: P>95%; **: P>99%)
(amino acids refer to 1st sequence: human)

            Pr(w>1)     post mean +- SE for w

     2 A      0.960*        4.512 +- 1.200
     1 M      0.700         3.100 +- 2.000

Time used:  0:02

Model 7: beta (10 categories)

Parameters in M7 (beta):
 p =   0.50000  q =   1.20000

Time used:  0:03
";

// --- TESTS PAIRWISE COMPARISON ---
#[test]
fn test_pairwise_ml_matrix() {
    let results = parse_str(PAIRWISE).unwrap();
    assert_eq!(results.len(), 1);
    let matrix = results[0].ml_matrix().unwrap();
    assert_eq!(matrix.method(), "ML");
    assert_eq!(matrix.names(), ["human", "chimp"]);

    // Pair "2 ... 1" lands at [1][0] only
    assert_eq!(matrix.value(1, 0, "lnL"), Some(-20.123456));
    assert_eq!(matrix.value(1, 0, "t"), Some(0.01));
    assert_eq!(matrix.value(1, 0, "kappa"), Some(2.0));
    assert_eq!(matrix.value(1, 0, "omega"), Some(0.5));
    assert_eq!(matrix.value(1, 0, "dS"), Some(0.006));
    assert_eq!(matrix.value(1, 0, "S"), Some(2.5));
    assert!(matrix.get(0, 1).is_none());
    assert_eq!(results[0].sequence("chimp").unwrap().residues, "ATGGCTAAA");
}

#[test]
fn test_pair_index_beyond_sequence_count() {
    let text = PAIRWISE.replace("2 (chimp) ... 1 (human)", "3000000 (chimp) ... 1 (human)");
    let results = parse_str(&text).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].ml_matrix().is_none());
    assert_eq!(results[0].sequences().len(), 2);
    assert!(results[0]
        .warnings()
        .iter()
        .any(|w| matches!(w.kind(), ErrorKind::MalformedLine(_)) && w.line() == 11));
}

// --- TESTS SITE-CLASS MODELS ---
#[test]
fn test_site_class_batch() {
    let results = parse_str(SITE_MODELS).unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.trees().is_empty());

    let models = result.site_class_models();
    assert_eq!(models.len(), 3);
    assert_eq!(models[0].model_num, 0);
    assert_eq!(models[0].likelihood, Some(-20.0));
    let one_ratio = models[0].site_classes.as_ref().unwrap();
    assert_eq!(one_ratio.proportions, vec![1.0]);
    assert_eq!(one_ratio.omegas, vec![0.4]);

    let m2 = &models[1];
    assert_eq!(m2.description, "PositiveSelection (3 categories)");
    assert_eq!(m2.likelihood, Some(-18.5));
    assert_eq!(m2.kappa, Some(2.1));
    assert_eq!(m2.site_classes.as_ref().unwrap().proportions, vec![0.8, 0.1, 0.1]);
    let neb = m2.neb_sites.as_ref().unwrap();
    assert_eq!(neb.len(), 2);
    assert_eq!(neb[0].significance, "*");
    assert_eq!(neb[1].position, 1);
    assert_eq!(neb[1].significance, "");
    assert!(m2.beb_sites.is_none());

    assert_eq!(models[2].shape_params, Some(ShapeParams::Beta { p: 0.5, q: 1.2 }));
    assert!(models[2].trees.is_empty());
}

// --- TESTS RUN BOUNDARIES ---
#[test]
fn test_data_sets_are_separate_results() {
    let results = parse_str(TWO_DATA_SETS).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].sequence("b").unwrap().residues, "ACGA");
    assert_eq!(results[1].sequence("b").unwrap().residues, "TTTA");
    assert_eq!(results[0].trees()[0].score(), Some(-10.0));
    assert_eq!(results[1].trees()[0].score(), Some(-12.0));
    assert_eq!(results[1].summary().input_file.as_deref(), Some("two.nuc"));
}

#[test]
fn test_concatenated_reports() {
    let text = format!("{}\n{}", PAIRWISE, TWO_DATA_SETS);
    let results = parse_str(&text).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].dialect(), Dialect::CodonModel);
    assert_eq!(results[1].dialect(), Dialect::NucleotideModel);
    assert!(results[1].ml_matrix().is_none());
}

#[test]
fn test_end_of_input_returns_none() {
    let mut parser = PamlParser::from_str(TWO_DATA_SETS);
    assert!(parser.next_result().unwrap().is_some());
    assert!(parser.next_result().unwrap().is_some());
    assert!(parser.next_result().unwrap().is_none());
    assert!(parser.next_result().unwrap().is_none());
}

#[test]
fn test_invalid_utf8_line_does_not_end_stream() {
    let mut bytes = TWO_DATA_SETS.as_bytes().to_vec();
    bytes.extend_from_slice(b"\nnote: caf\xE9\n");
    let results = PamlParser::from_reader(&bytes[..]).unwrap().into_results().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].sequence("a").unwrap().residues, "ACGT");
    assert_eq!(results[1].sequence("b").unwrap().residues, "TTTA");
}

#[test]
fn test_warnings_after_last_result_are_kept() {
    let text = format!(
        "{}\nBASEML (in paml version 4.9, March 2015)  tail.nuc  JC69\n\nTREE #  1:  ((1, 2);   MP score: 1\n",
        TWO_DATA_SETS
    );
    let mut parser = PamlParser::from_str(&text);
    assert!(parser.next_result().unwrap().is_some());
    assert!(parser.next_result().unwrap().is_some());
    assert!(parser.next_result().unwrap().is_none());

    let trailing = parser.take_trailing_warnings();
    assert_eq!(trailing.len(), 1);
    assert!(matches!(trailing[0].kind(), ErrorKind::MalformedLine(_)));
    assert_eq!(trailing[0].line(), 29);
    assert!(parser.take_trailing_warnings().is_empty());
}

// --- TESTS ERRORS ---
#[test]
fn test_heuristic_search_is_unsupported() {
    let text = "\
CODONML (in paml version 4.9, March 2015)  big.nuc   Model: One dN/dS ratio
ns =   2  ls =   1

a   ATG
b   ATG

stage 0: 2 trees
";
    let err = parse_str(text).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnsupportedDialect(_)));
    assert!(err.is_fatal());
    assert_eq!(err.line(), 7);
}

#[test]
fn test_parser_recovers_after_fatal_error() {
    let text = format!(
        "CODONML (in paml version 4.9, March 2015)  big.nuc\n\nHeuristic tree search by stepwise addition\n\n{}",
        TWO_DATA_SETS
    );
    let mut parser = PamlParser::from_str(&text);
    let err = parser.next_result().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnsupportedDialect(_)));

    let next = parser.next_result().unwrap().unwrap();
    assert_eq!(next.dialect(), Dialect::NucleotideModel);
    assert!(parser.next_result().unwrap().is_some());
    assert!(parser.next_result().unwrap().is_none());
}

#[test]
fn test_amino_acid_pairwise_not_yet_implemented() {
    let text = "\
AAML (in paml version 4.9, March 2015)  seq.aa  Model: Empirical (wag.dat)
ns =   2  ls =   3

a   MKV
b   MKL

ML distances of aa seqs.
";
    let err = parse_str(text).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NotYetImplemented(_)));
}

#[test]
fn test_unrecognized_format() {
    let err = parse_str("#NEXUS\nbegin trees;\n").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnrecognizedFormat(_)));
    assert!(parse_str("\n\n").unwrap().is_empty());
}

#[test]
fn test_sequence_count_mismatch_is_fatal_only_when_strict() {
    let text = "\
BASEML (in paml version 4.9, March 2015)  short.nuc  JC69
ns =   3  ls =   4

a   ACGT
b   ...A

TREE #  1:  (1, 2);   MP score: 1
";
    let err = parse_str(text).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedLine(_)));

    let results = PamlParser::from_str(text)
        .with_strict_sequence_count(false)
        .into_results()
        .unwrap();
    assert_eq!(results[0].sequences().len(), 2);
    assert!(results[0]
        .warnings()
        .iter()
        .any(|w| matches!(w.kind(), ErrorKind::MalformedLine(_))));
}
