use pamlwick::model::{PhyloTree, TagValue};

#[test]
fn test_building_tree() {
    let mut tree = PhyloTree::new();
    let index_l1 = tree.add_leaf(Some("human".into()), Some(1.0));
    let index_l2 = tree.add_leaf(Some("chimp".into()), Some(1.0));
    let index_l3 = tree.add_leaf(Some("gorilla".into()), Some(0.5));
    let index_l4 = tree.add_leaf(Some("orangutan".into()), Some(2.0));
    let index_i1 = tree.add_internal(vec![index_l1, index_l2], Some("6".into()), Some(1.5));
    let index_root = tree.add_root(vec![index_i1, index_l3, index_l4], Some("5".into()), None);

    // Counts
    assert_eq!(tree.num_leaves(), 4);
    assert_eq!(tree.num_internal(), 2);
    assert_eq!(tree.num_vertices(), 6);
    assert!(tree.is_valid());

    // Root
    assert_eq!(tree.root().index(), index_root);
    let root = tree.root();
    assert!(root.is_root());
    assert_eq!(root.children(), &[index_i1, index_l3, index_l4]);

    // Leaf
    let l2 = &tree[index_l2];
    assert!(l2.is_leaf());
    assert_eq!(l2.index(), index_l2);
    assert_eq!(l2.parent(), Some(index_i1));
    assert_eq!(l2.label(), Some("chimp"));

    // Internal
    let inti = &tree[index_i1];
    assert!(inti.is_internal());
    assert_eq!(inti.label(), Some("6"));
    assert_eq!(inti.branch_length(), Some(1.5));

    assert_eq!(tree.total_branch_length(), 6.0);
    assert_eq!(tree.leaves(), vec![index_l1, index_l2, index_l3, index_l4]);
}

#[test]
fn test_lca_and_depth() {
    let tree = pamlwick::parse_newick_str("((a,b),(c,(d,e)),f);").unwrap();
    let a = tree.find_by_label("a").unwrap();
    let b = tree.find_by_label("b").unwrap();
    let d = tree.find_by_label("d").unwrap();
    let c = tree.find_by_label("c").unwrap();
    let f = tree.find_by_label("f").unwrap();

    assert_eq!(tree.depth(d), 3);
    assert_eq!(tree.depth(tree.root_index()), 0);
    assert_eq!(tree.lca(a, b), tree[a].parent().unwrap());
    assert_eq!(tree.lca(d, c), tree[c].parent().unwrap());
    assert_eq!(tree.lca(a, f), tree.root_index());
    assert_eq!(tree.lca(d, d), d);
    assert_eq!(tree.lca_of(&[c, d]), tree[c].parent());
    assert_eq!(tree.lca_of(&[b]), Some(b));
    assert_eq!(tree.lca_of(&[]), None);
}

#[test]
fn test_traversal_orders() {
    let tree = pamlwick::parse_newick_str("((a,b)x,c)r;").unwrap();
    let post: Vec<&str> = tree.post_order_iter().filter_map(|v| v.label()).collect();
    assert_eq!(post, vec!["a", "b", "x", "c", "r"]);
    let pre: Vec<&str> = tree.pre_order_iter().filter_map(|v| v.label()).collect();
    assert_eq!(pre, vec!["r", "x", "a", "b", "c"]);
}

#[test]
fn test_vertex_tags() {
    let mut tree = pamlwick::parse_newick_str("(1,2,3);").unwrap();
    assert!(tree.has_numbered_leaves());
    let one = tree.find_by_label("1").unwrap();
    tree.vertex_mut(one).tags_mut().add("dN", 0.01);
    tree.vertex_mut(one).tags_mut().add("dN", 0.02);
    assert_eq!(tree[one].tags().get_all("dN"), &[TagValue::Float(0.01), TagValue::Float(0.02)]);
    assert!(tree[tree.root_index()].tags().is_empty());
}

#[test]
#[should_panic]
fn test_get_root_panics_on_empty_tree() {
    let tree = PhyloTree::new();
    tree.root(); // Should panic
}

#[test]
#[should_panic]
fn test_get_vertex_out_of_bounds() {
    let tree = PhyloTree::new();
    let _ = &tree[55];
}
