use logtrail::ngrams::{ngram_tables, top_ngrams};

#[test]
fn ties_are_broken_alphabetically() {
    let p = ["b a", "a b"];
    let t = top_ngrams(&p, 2, 10);
    let phrases: Vec<&str> = t.top.iter().map(|g| g.phrase.as_str()).collect();
    assert_eq!(phrases, vec!["a b", "b a"]);
}

#[test]
fn one_table_per_size_limited_to_k() {
    let p: Vec<String> = (0..20).map(|i| format!("w{i} x y z")).collect();
    let tables = ngram_tables(&p, &[2, 3, 4], 10);
    assert_eq!(tables.iter().map(|t| t.n).collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(tables[0].top.len(), 10);
    assert_eq!(tables[0].top[0].phrase, "x y");
    assert_eq!(tables[0].top[0].count, 20);
    assert_eq!(tables[2].top.len(), 10);
    assert!(tables[2].top.iter().all(|g| g.count == 1));
}
