//! Environment for quantified variable bindings during evaluation

use crate::ast::Variable;
use crate::instance::Atom;

/// Stack-based environment mapping quantified variables to atoms
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Stack of (variable, atom) bindings
    bindings: Vec<(Variable, Atom)>,
}

impl Environment {
    /// Creates an empty environment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pushes a new binding (for entering quantifier scope)
    pub fn extend(&mut self, var: Variable, atom: Atom) {
        self.bindings.push((var, atom));
    }

    /// Pops the most recent binding (for exiting quantifier scope)
    pub fn pop(&mut self) {
        self.bindings.pop();
    }

    /// Looks up a variable, most recent binding first
    pub fn lookup(&self, var: &Variable) -> Option<Atom> {
        self.bindings
            .iter()
            .rev()
            .find(|(v, _)| v == var)
            .map(|&(_, atom)| atom)
    }

    /// Returns the bindings in force, outermost first
    pub fn bindings(&self) -> &[(Variable, Atom)] {
        &self.bindings
    }

    /// Number of bindings on the stack
    pub fn depth(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Universe;
    use crate::schema::Schema;

    fn atoms(n: usize) -> Vec<Atom> {
        let mut schema = Schema::new();
        schema.register_sig("A", None, false).unwrap();
        Universe::new(&schema, &[0, n]).atoms().collect()
    }

    #[test]
    fn empty_environment() {
        let env = Environment::empty();
        assert!(env.lookup(&Variable::unary("x")).is_none());
        assert_eq!(env.depth(), 0);
    }

    #[test]
    fn shadowing_and_pop() {
        let a = atoms(2);
        let mut env = Environment::empty();
        let x = Variable::unary("x");
        let y = Variable::unary("y");

        env.extend(x.clone(), a[0]);
        env.extend(y.clone(), a[1]);
        env.extend(x.clone(), a[1]);
        assert_eq!(env.lookup(&x), Some(a[1]));

        env.pop();
        assert_eq!(env.lookup(&x), Some(a[0]));
        assert_eq!(env.lookup(&y), Some(a[1]));

        env.pop();
        env.pop();
        assert!(env.lookup(&x).is_none());
    }
}
