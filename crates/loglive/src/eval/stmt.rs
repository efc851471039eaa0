//! Statement evaluation

use super::pattern::BindMode;
use super::{ControlFlow, Evaluate, Interpreter};
use crate::environment::Scope;
use crate::error::{EnvironmentError, EvalError};
use crate::syntax::ast::{
    CatchClause, ExportDecl, Expr, Stmt, StmtKind, SwitchCase, VarDecl,
};
use crate::value::{ErrorTag, Value};

impl Evaluate for Stmt {
    fn eval(&self, cx: &mut Interpreter<'_>, scope: &Scope) -> Result<Value, EvalError> {
        match &self.kind {
            StmtKind::Empty | StmtKind::TypeOnly | StmtKind::Import(_) => Ok(Value::Undefined),
            StmtKind::Expression(expr) => {
                expr.eval(cx, scope)?;
                Ok(Value::Undefined)
            }
            StmtKind::Block(body) => cx.run_block(body, &scope.child()),
            StmtKind::VarDecl(decl) => cx.declare_vars(decl, scope),
            StmtKind::Function(function) => {
                // Already declared when the enclosing block was hoisted
                if let Some(name) = &function.name {
                    if !scope.declares(name) {
                        let value = cx.make_function(function, scope);
                        scope.declare(name.clone(), value, true);
                    }
                }
                Ok(Value::Undefined)
            }
            StmtKind::Class(class) => {
                let value = cx.create_class(class, None, scope)?;
                if let Some(name) = &class.name {
                    scope.declare(name.clone(), value, true);
                }
                Ok(Value::Undefined)
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                if test.eval(cx, scope)?.truthy() {
                    cx.run_statement(consequent, scope)
                } else if let Some(alternate) = alternate {
                    cx.run_statement(alternate, scope)
                } else {
                    Ok(Value::Undefined)
                }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => cx.eval_for(init.as_ref(), test.as_ref(), update.as_ref(), body, scope),
            StmtKind::ForInOf {
                kind,
                left,
                right,
                body,
            } => cx.eval_for_in_of(*kind, left, right, body, scope),
            StmtKind::While { test, body } => cx.eval_while(test, body, scope),
            StmtKind::DoWhile { body, test } => cx.eval_do_while(body, test, scope),
            StmtKind::Switch {
                discriminant,
                cases,
            } => cx.eval_switch(discriminant, cases, scope),
            StmtKind::Break => Err(EvalError::ControlFlow(ControlFlow::Break)),
            StmtKind::Continue => Err(EvalError::ControlFlow(ControlFlow::Continue)),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => expr.eval(cx, scope)?,
                    None => Value::Undefined,
                };
                Err(EvalError::ControlFlow(ControlFlow::return_value(value)))
            }
            StmtKind::Throw(expr) => Err(EvalError::Thrown(expr.eval(cx, scope)?)),
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => cx.eval_try(block, handler.as_ref(), finalizer.as_deref(), scope),
            StmtKind::Export(export) => match export {
                ExportDecl::Declaration(stmt) | ExportDecl::DefaultDeclaration(stmt) => {
                    stmt.eval(cx, scope)
                }
                ExportDecl::DefaultExpr(expr) => {
                    expr.eval(cx, scope)?;
                    Ok(Value::Undefined)
                }
                ExportDecl::Named { .. } | ExportDecl::All { .. } => Ok(Value::Undefined),
            },
        }
    }
}

impl Interpreter<'_> {
    /// `let a = 1, { b } = obj`
    pub(super) fn declare_vars(&mut self, decl: &VarDecl, scope: &Scope) -> Result<Value, EvalError> {
        let mode = BindMode::declaring(decl.kind);
        for declarator in &decl.declarators {
            let value = match (&declarator.init, declarator.target.as_ident()) {
                (Some(init), Some(name)) => self.eval_named(init, name, scope)?,
                (Some(init), None) => init.eval(self, scope)?,
                (None, _) => Value::Undefined,
            };
            self.bind_pattern(&declarator.target, value, scope, mode)?;
        }
        Ok(Value::Undefined)
    }

    fn eval_switch(
        &mut self,
        discriminant: &Expr,
        cases: &[SwitchCase],
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let value = discriminant.eval(self, scope)?;
        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if test.eval(self, scope)?.strict_equals(&value) {
                    start = Some(i);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|c| c.test.is_none())) else {
            return Ok(Value::Undefined);
        };

        // Cases share one block scope and fall through until `break`
        let block = scope.child();
        for case in &cases[start..] {
            for stmt in &case.body {
                match stmt.eval(self, &block) {
                    Ok(_) => {}
                    Err(EvalError::ControlFlow(ControlFlow::Break)) => {
                        return Ok(Value::Undefined)
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(Value::Undefined)
    }

    fn eval_try(
        &mut self,
        block: &[Stmt],
        handler: Option<&CatchClause>,
        finalizer: Option<&[Stmt]>,
        scope: &Scope,
    ) -> Result<Value, EvalError> {
        let mut result = self.run_block(block, &scope.child());

        if let (Err(err), Some(handler)) = (&result, handler) {
            if let Some(thrown) = caught_value(err) {
                let catch_scope = scope.child();
                if let Some(param) = &handler.param {
                    self.bind_pattern(param, thrown, &catch_scope, BindMode::LET)?;
                }
                result = self.run_block(&handler.body, &catch_scope);
            }
        }

        if let Some(finalizer) = finalizer {
            self.run_block(finalizer, &scope.child())?;
        }
        result
    }
}

/// The value a `catch` clause sees for `err`, or `None` when evaluated
/// code may not observe it (timeouts, interrupts, jumps).
fn caught_value(err: &EvalError) -> Option<Value> {
    if !err.is_catchable() {
        return None;
    }
    Some(match err {
        EvalError::Thrown(value) => value.clone(),
        EvalError::UndefinedVariable { name } => {
            Value::error(ErrorTag::ReferenceError, format!("{} is not defined", name))
        }
        EvalError::TypeError { message } => Value::error(ErrorTag::TypeError, message),
        EvalError::RangeError { message } => Value::error(ErrorTag::RangeError, message),
        EvalError::BuiltinError { name, message } => {
            Value::error(ErrorTag::Error, format!("{}: {}", name, message))
        }
        EvalError::Environment(EnvironmentError::StackOverflow { .. }) => Value::error(
            ErrorTag::RangeError,
            "Maximum call stack size exceeded",
        ),
        EvalError::Environment(env) => Value::error(ErrorTag::TypeError, env.to_string()),
        EvalError::Syntax(syntax) => Value::error(ErrorTag::SyntaxError, &syntax.message),
        other => Value::error(ErrorTag::Error, other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use crate::eval::evaluate;
    use crate::{EvalContext, Environment, EvaluationOutcome};
    use pretty_assertions::assert_eq;

    fn run(body: &str) -> String {
        let src = format!("(() => {{ {} }})()", body);
        match evaluate(&src, &Environment::new(), &EvalContext::new()) {
            EvaluationOutcome::Value(v) => v.to_display_string(),
            EvaluationOutcome::Failure(f) => format!("!{}", f.message),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Declarations
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_declarations_and_block_scope() {
        assert_eq!(run("let a = 1; { let a = 2; } return a;"), "1");
        assert_eq!(run("let a; return a;"), "undefined");
        assert_eq!(run("const f = function () {}; return f.name;"), "f");
    }

    #[test]
    fn test_local_class_declaration() {
        assert_eq!(
            run("class A { v() { return 1 } } return new A().v();"),
            "1"
        );
    }

    // ═══════════════════════════════════════════════════════════════════
    // Control Flow
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_if_else() {
        assert_eq!(run("if (0) return 'a'; else if (1) return 'b'; return 'c';"), "b");
    }

    #[test]
    fn test_switch_fallthrough_and_default() {
        let body = "const out = []; switch (x) { case 1: out.push('one'); case 2: out.push('two'); break; default: out.push('other'); } return out;";
        assert_eq!(run(&format!("const x = 1; {}", body)), "[ 'one', 'two' ]");
        assert_eq!(run(&format!("const x = 9; {}", body)), "[ 'other' ]");
        assert_eq!(run(&format!("const x = '1'; {}", body)), "[ 'other' ]");
    }

    #[test]
    fn test_uncaught_throw() {
        assert_eq!(run("throw 'boom'"), "!Uncaught boom");
    }

    // ═══════════════════════════════════════════════════════════════════
    // Exceptions
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn test_try_catch_thrown_value() {
        assert_eq!(run("try { throw 42 } catch (e) { return e + 1 }"), "43");
    }

    #[test]
    fn test_catch_converts_runtime_errors() {
        assert_eq!(
            run("try { missing } catch (e) { return [e.name, e.message] }"),
            "[ 'ReferenceError', 'missing is not defined' ]"
        );
        assert_eq!(
            run("try { null.x } catch (e) { return e instanceof TypeError }"),
            "true"
        );
        assert_eq!(
            run("const f = () => f(); try { f() } catch (e) { return e.name }"),
            "RangeError"
        );
    }

    #[test]
    fn test_finally_always_runs() {
        assert_eq!(
            run("const log = []; const f = () => { try { return 1 } finally { log.push('f') } }; return [f(), log];"),
            "[ 1, [ 'f' ] ]"
        );
        assert_eq!(
            run("const log = []; try { try { throw 1 } finally { log.push('inner') } } catch (e) { log.push(e) } return log;"),
            "[ 'inner', 1 ]"
        );
    }

    #[test]
    fn test_catch_without_binding() {
        assert_eq!(run("try { throw 1 } catch { return 'caught' }"), "caught");
    }
}
