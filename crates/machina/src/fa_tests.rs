use crate::{
    analyze_structure, compile_regex, generate_strings, minimize_dfa, nfa_to_dfa, simplify_nfa, simulate,
    Automaton, DfaTable, Limits,
};

fn compile_pipeline(re_str: &str, quiet: bool) -> Automaton {
    let limits = Limits::default();

    let nfa = compile_regex(re_str).expect("failed to compile regex");
    if !quiet {
        println!("nfa = {:?}", nfa);
    }

    let dfa = nfa_to_dfa(&nfa, &limits).expect("failed to determinize");
    if !quiet {
        println!("dfa = {:?}", dfa);
    }

    let dfa = minimize_dfa(&dfa, &limits).expect("failed to minimize");
    if !quiet {
        println!("minimized = {:?}", dfa);
    }

    dfa
}

fn run_vectors(tests: &[(&str, bool)], automaton: &Automaton, re_str: &str) {
    for (test, expected_result) in tests {
        let result = simulate(automaton, test).unwrap().accepted;
        assert_eq!(
            result, *expected_result,
            "'{}' failed on input '{}', expect match: {}, actual match: {}",
            re_str, test, expected_result, result
        );
    }
}

#[test]
fn basic() {
    let re_str = r"a(b|c)*";
    let dfa = compile_pipeline(re_str, false);

    let test_vectors = vec![
        ("a", true),
        ("b", false),
        ("x", false),
        ("", false),
        ("ab", true),
        ("ac", true),
        ("ca", false),
        ("abcbc", true),
        ("acbcb", true),
        ("bcbc", false),
        ("abbbbbbbbbb", true),
    ];

    run_vectors(&test_vectors, &dfa, re_str)
}

#[test]
fn textbook_regex() {
    let re_str = r"(a|b)*abb";
    let dfa = compile_pipeline(re_str, true);

    let test_vectors = vec![
        ("a", false),
        ("ab", false),
        ("aab", false),
        ("abb", true),
        ("aabb", true),
        ("babb", true),
        ("abba", false),
        ("bbbbabb", true),
    ];

    run_vectors(&test_vectors, &dfa, re_str);

    let table = DfaTable::from_automaton(&dfa).unwrap();
    for (test, expected_result) in test_vectors {
        assert_eq!(table.matches(test), expected_result, "table disagrees on '{test}'");
    }
}

#[test]
fn nested_groups() {
    let re_str = r"(a(b|c))*d|e0";
    // 'e' is reserved for epsilon
    assert!(compile_regex(re_str).is_err());

    let re_str = r"(a(b|c))*d|x0";
    let dfa = compile_pipeline(re_str, true);

    let test_vectors = vec![
        ("d", true),
        ("abd", true),
        ("acabd", true),
        ("x0", true),
        ("ad", false),
        ("abx0", false),
        ("", false),
    ];

    run_vectors(&test_vectors, &dfa, re_str)
}

#[test]
fn every_stage_agrees() {
    let limits = Limits::default();
    let re_str = r"(ab|b)*a";
    let nfa = compile_regex(re_str).unwrap();
    let simplified = simplify_nfa(&nfa, &limits).unwrap();
    let dfa = nfa_to_dfa(&nfa, &limits).unwrap();
    let minimal = minimize_dfa(&dfa, &limits).unwrap();

    for input in ["a", "ba", "aba", "bba", "ab", "abab", "", "aa"] {
        let expected = simulate(&nfa, input).unwrap().accepted;
        for (name, automaton) in [("simplified", &simplified), ("dfa", &dfa), ("minimal", &minimal)] {
            assert_eq!(
                simulate(automaton, input).unwrap().accepted,
                expected,
                "{name} disagrees with the NFA of '{re_str}' on '{input}'"
            );
        }
    }
}

#[test]
fn generated_strings_are_accepted() {
    let dfa = compile_pipeline(r"(a|b)*abb", true);
    let strings = generate_strings(&dfa, 10, 8).unwrap();
    assert_eq!(strings.first().map(String::as_str), Some("abb"));
    for s in &strings {
        assert!(simulate(&dfa, s).unwrap().accepted, "'{s}' should be accepted");
    }
}

#[test]
fn minimal_dfa_has_no_useless_states() {
    let dfa = compile_pipeline(r"a(b|c)*", true);
    let report = analyze_structure(&dfa).unwrap();
    assert!(report.unreachable.is_empty());
    assert!(report.trap.is_empty());
}
