use std::collections::HashMap;
use std::fmt;

use super::diagnostics::*;
use super::lexer::*;
use super::term::*;

#[derive(Debug, Clone)]
pub struct Rule {
    pub loc: Loc,
    pub head: Term,
    pub body: Term,
}

impl Rule {
    /// Parses one `pattern = result` pair. The caller owns the line
    /// discipline around it: in library files every rule sits on its own
    /// line, terminated by the newline.
    pub fn parse(lexer: &mut Lexer, diag: &mut impl Diagnoster) -> Option<Self> {
        let loc = lexer.peek_token().loc.clone();
        let head = Term::parse(lexer, diag)?;
        lexer.expect_token(TokenKind::Equals).map_err(|(expected_kind, actual_token)| {
            diag.report(&actual_token.loc, Severity::Error, &format!("expected {expected_kind} between the pattern and the result of the rule, but got {actual_token} instead", actual_token = actual_token.report()));
        }).ok()?;
        let body = Term::parse(lexer, diag)?;
        Some(Self { loc, head, body })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.head, self.body)
    }
}

/// The rule database. Rules are indexed by the head atom of their pattern
/// and kept in insertion order, both per head and overall: within one head
/// the first matching rule wins, so the order rules were loaded in is part
/// of a program's meaning.
#[derive(Default)]
pub struct Ruleset {
    rules: Vec<Rule>,
    by_head: HashMap<String, Vec<usize>>,
}

impl Ruleset {
    pub fn insert(&mut self, rule: Rule, diag: &mut impl Diagnoster) -> Option<()> {
        if let Term::Atom(name) = &rule.head {
            if is_variable(name) {
                diag.report(&rule.loc, Severity::Error, &format!("the pattern of a rule must not be a bare variable, but `{}` is one", name));
                return None;
            }
        }
        let head_atom = rule.head.head_atom().to_string();
        self.by_head.entry(head_atom).or_default().push(self.rules.len());
        self.rules.push(rule);
        Some(())
    }

    /// Loads a whole library: a sequence of rules separated by newlines,
    /// with blank and comment-only lines skipped. Appends to whatever is
    /// already loaded and returns how many rules were added.
    pub fn load(&mut self, lexer: &mut Lexer, diag: &mut impl Diagnoster) -> Option<usize> {
        let mut count = 0;
        loop {
            while lexer.peek_token().kind == TokenKind::Newline {
                lexer.next_token();
            }
            if lexer.peek_token().kind == TokenKind::End {
                return Some(count);
            }
            let rule = Rule::parse(lexer, diag)?;
            match lexer.peek_token().kind {
                TokenKind::Newline => {
                    lexer.next_token();
                }
                TokenKind::End => {}
                _ => {
                    let token = lexer.next_token();
                    diag.report(&token.loc, Severity::Error, &format!("expected the end of the line after the rule, but got {} instead", token.report()));
                    return None;
                }
            }
            self.insert(rule, diag)?;
            count += 1;
        }
    }

    /// One leftmost-outermost reduction step, or None if the term is in
    /// normal form. Rules under the head atom are tried against the whole
    /// term first, in insertion order; only when none of them matches do
    /// the children get a chance, left to right.
    pub fn step(&self, term: &Term) -> Option<Term> {
        if let Some(indices) = self.by_head.get(term.head_atom()) {
            for &index in indices {
                let rule = &self.rules[index];
                if let Some(bindings) = pattern_match(&rule.head, term) {
                    let mut result = rule.body.clone();
                    result.substitute(&bindings);
                    return Some(result);
                }
            }
        }
        if let Term::App(children) = term {
            for (index, child) in children.iter().enumerate() {
                if let Some(stepped) = self.step(child) {
                    let mut children = children.clone();
                    children[index] = stepped;
                    return Some(Term::App(children));
                }
            }
        }
        None
    }

    /// Rewrites until no rule applies anywhere. Divergent rule sets
    /// diverge right here: a step budget is the host's concern, imposed by
    /// driving [step](Self::step) directly.
    pub fn reduce(&self, mut term: Term) -> Term {
        while let Some(next) = self.step(&term) {
            term = next
        }
        term
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
        self.by_head.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sink {
        reports: Vec<(Severity, String)>,
    }

    impl Diagnoster for Sink {
        fn report(&mut self, _loc: &Loc, severity: Severity, message: &str) {
            self.reports.push((severity, message.to_string()));
        }
    }

    fn term(source: &str) -> Term {
        let mut lexer = Lexer::new(source.chars().collect(), None);
        let term = Term::parse(&mut lexer, &mut StdoutDiagnoster {})
            .unwrap_or_else(|| panic!("`{}` must be a well-formed term", source));
        lexer.expect_token(TokenKind::End)
            .unwrap_or_else(|_| panic!("`{}` must be a single term", source));
        term
    }

    fn ruleset(source: &str) -> Ruleset {
        let mut rules = Ruleset::default();
        let mut lexer = Lexer::new(source.chars().collect(), None);
        rules.load(&mut lexer, &mut StdoutDiagnoster {})
            .unwrap_or_else(|| panic!("`{}` must be a well-formed library", source));
        rules
    }

    #[test]
    fn an_empty_database_normalizes_nothing() {
        let rules = Ruleset::default();
        let input = term("+ (s 0) (s 0)");
        assert_eq!(rules.step(&input), None);
        assert_eq!(rules.reduce(input.clone()), input);
    }

    #[test]
    fn a_single_identity_rule_unwraps_nesting() {
        let rules = ruleset("id X = X");
        assert_eq!(rules.reduce(term("id (id foo)")), term("foo"));
    }

    #[test]
    fn bare_atoms_reduce_by_atom_headed_rules() {
        let rules = ruleset("two = s (s 0)");
        assert_eq!(rules.step(&term("two")), Some(term("s (s 0)")));
        // Inside an application the bare-atom rule fires on the child, not
        // on the application itself.
        assert_eq!(rules.step(&term("two extra")), Some(term("(s (s 0)) extra")));
    }

    #[test]
    fn the_first_matching_rule_wins() {
        let rules = ruleset("pick A = first\npick A = second");
        assert_eq!(rules.reduce(term("pick x")), term("first"));
    }

    #[test]
    fn outer_redexes_are_taken_before_inner_ones() {
        let rules = ruleset("f X = ok\narg = evil");
        // The whole application matches, so the argument must survive
        // untouched inside the binding.
        assert_eq!(rules.step(&term("f arg")), Some(term("ok")));
    }

    #[test]
    fn children_reduce_left_to_right_when_the_outer_level_is_stuck() {
        let rules = ruleset("a = b\nc = d");
        assert_eq!(rules.step(&term("g a c")), Some(term("g b c")));
        assert_eq!(rules.reduce(term("g a c")), term("g b d"));
    }

    #[test]
    fn rules_index_under_the_leftmost_descended_atom() {
        let rules = ruleset("(f A) B = pair A B");
        assert_eq!(rules.reduce(term("(f x) y")), term("pair x y"));
        assert_eq!(rules.step(&term("f x y")), None);
    }

    #[test]
    fn nonlinear_patterns_reject_unequal_arguments() {
        let rules = ruleset("dup X X = t");
        assert_eq!(rules.reduce(term("dup a a")), term("t"));
        assert_eq!(rules.reduce(term("dup a b")), term("dup a b"));
    }

    #[test]
    fn rewriting_reenters_the_new_term() {
        let rules = ruleset("a = b\nb = c\nc = done");
        assert_eq!(rules.reduce(term("a")), term("done"));
    }

    #[test]
    fn normal_forms_are_stable() {
        let rules = ruleset("+ A 0 = A");
        let normal = rules.reduce(term("+ (s 0) (s 0)"));
        assert_eq!(rules.step(&normal), None);
        assert_eq!(rules.reduce(normal.clone()), normal);
    }

    #[test]
    fn reduction_is_deterministic() {
        let rules = ruleset("+ A 0 = A\n+ A (s B) = + (s A) B");
        let input = term("+ (s 0) (s (s 0))");
        assert_eq!(rules.reduce(input.clone()), rules.reduce(input));
    }

    #[test]
    fn a_variable_headed_rule_is_rejected() {
        let mut sink = Sink { reports: Vec::new() };
        let mut rules = Ruleset::default();
        let mut lexer = Lexer::new("X = foo".chars().collect(), None);
        assert_eq!(rules.load(&mut lexer, &mut sink), None);
        assert!(rules.is_empty());
        assert!(sink.reports.iter().any(|(severity, message)| {
            *severity == Severity::Error && message.contains("bare variable")
        }));
    }

    #[test]
    fn a_missing_equals_is_rejected() {
        let mut sink = Sink { reports: Vec::new() };
        let mut rules = Ruleset::default();
        let mut lexer = Lexer::new("f X\n".chars().collect(), None);
        assert_eq!(rules.load(&mut lexer, &mut sink), None);
    }

    #[test]
    fn loading_appends_and_reloading_appends_again() {
        let mut rules = ruleset("pick A = first");
        let mut lexer = Lexer::new("pick A = second".chars().collect(), None);
        rules.load(&mut lexer, &mut StdoutDiagnoster {}).expect("the second load must succeed");
        assert_eq!(rules.len(), 2);
        // The earlier rule still shadows the later one.
        assert_eq!(rules.reduce(term("pick x")), term("first"));
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let rules = ruleset("# naturals\n\nzero = 0\n\n# successor chains\none = s 0 # trailing note\n");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.reduce(term("one")), term("s 0"));
    }

    #[test]
    fn divergent_rules_keep_stepping_forever() {
        let rules = ruleset("loop = loop");
        let mut current = term("loop");
        // The engine has no watchdog, so bound the spin here, the way a
        // host would.
        for _ in 0..100 {
            current = rules.step(&current).expect("a divergent term always has a next step");
        }
        assert_eq!(current, term("loop"));
    }

    #[test]
    fn body_only_variables_load_silently_and_stay_inert() {
        let rules = ruleset("mystery = Answer");
        assert_eq!(rules.reduce(term("mystery")), term("Answer"));
    }
}
