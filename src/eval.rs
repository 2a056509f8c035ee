use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::ast::{BlockStmt, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::builtins::Builtin;
use crate::environment::Environment;
use crate::object::{FunctionValue, RuntimeError, Value};

/// Tree-walking evaluator.
///
/// `output` is where `puts` writes.  `is_returning` carries a pending
/// `return` value upward: it is set by return statements, left alone by
/// block evaluation (so returns pierce nested blocks), and taken at
/// function-call boundaries and at the top of a program.
#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    is_returning: Option<Value>,
}

impl<'t, W: Write> Evaluator<'t, W> {
    pub fn new(output: &'t mut W) -> Evaluator<'t, W> {
        Evaluator {
            output,
            is_returning: None,
        }
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut *self.output
    }

    /// Evaluate a program against `env`.  `Ok(None)` means the final
    /// statement produced no value (a trailing `let`, or an empty
    /// program); the REPL stays silent in that case.
    pub fn eval_program(
        &mut self,
        program: &Program,
        env: &Rc<Environment>,
    ) -> Result<Option<Value>, RuntimeError> {
        // An error can unwind past a pending return set by the same
        // statement; do not let it leak into this run.
        self.is_returning = None;
        let mut result = None;
        for stmt in &program.statements {
            result = self.eval_stmt(stmt, env)?;
            if let Some(value) = self.is_returning.take() {
                return Ok(Some(value));
            }
        }
        Ok(result)
    }

    fn eval_stmt(
        &mut self,
        stmt: &Stmt,
        env: &Rc<Environment>,
    ) -> Result<Option<Value>, RuntimeError> {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval_expr(value, env)?;
                env.set(name.clone(), value);
                Ok(None)
            }
            Stmt::Return(value) => {
                let value = self.eval_expr(value, env)?;
                self.is_returning = Some(value);
                Ok(None)
            }
            Stmt::Expression(expr) => Ok(Some(self.eval_expr(expr, env)?)),
        }
    }

    /// Evaluate a block in the *current* environment; only function calls
    /// open a new frame.  A pending return stops the iteration but stays
    /// set for the enclosing program or call site.
    fn eval_block(
        &mut self,
        block: &BlockStmt,
        env: &Rc<Environment>,
    ) -> Result<Option<Value>, RuntimeError> {
        let mut result = None;
        for stmt in &block.statements {
            result = self.eval_stmt(stmt, env)?;
            if self.is_returning.is_some() {
                break;
            }
        }
        Ok(result)
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Int(value) => Ok(Value::Integer(*value)),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Str(text) => Ok(Value::from_string(text)),
            Expr::Ident(name) => match env.get(name) {
                Some(value) => Ok(value),
                None => Builtin::lookup(name)
                    .map(Value::Builtin)
                    .ok_or_else(|| RuntimeError::IdentifierNotFound(name.clone())),
            },
            Expr::Prefix { op, right } => {
                let right = self.eval_expr(right, env)?;
                eval_prefix(*op, right)
            }
            Expr::Infix { op, left, right } => {
                let left = self.eval_expr(left, env)?;
                let right = self.eval_expr(right, env)?;
                eval_infix(*op, left, right)
            }
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.eval_expr(condition, env)?;
                if is_truthy(&condition) {
                    Ok(self.eval_block(consequence, env)?.unwrap_or(Value::Null))
                } else if let Some(alternative) = alternative {
                    Ok(self.eval_block(alternative, env)?.unwrap_or(Value::Null))
                } else {
                    Ok(Value::Null)
                }
            }
            Expr::Function { params, body } => Ok(Value::Function(Rc::new(FunctionValue {
                params: params.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            }))),
            Expr::Call { function, args } => {
                let function = self.eval_expr(function, env)?;
                let args = args
                    .iter()
                    .map(|a| self.eval_expr(a, env))
                    .collect::<Result<Vec<Value>, RuntimeError>>()?;
                self.apply_function(function, args)
            }
            Expr::Array(elements) => {
                let elements = elements
                    .iter()
                    .map(|e| self.eval_expr(e, env))
                    .collect::<Result<Vec<Value>, RuntimeError>>()?;
                Ok(Value::Array(Rc::from(elements)))
            }
            Expr::Index { left, index } => {
                let left = self.eval_expr(left, env)?;
                let index = self.eval_expr(index, env)?;
                eval_index(left, index)
            }
            Expr::Hash(pairs) => {
                let mut map = HashMap::new();
                for (key_expr, value_expr) in pairs {
                    let key = self.eval_expr(key_expr, env)?;
                    let key = key
                        .hash_key()
                        .ok_or_else(|| RuntimeError::UnusableHashKey(key.type_name()))?;
                    let value = self.eval_expr(value_expr, env)?;
                    map.insert(key, value);
                }
                Ok(Value::Hash(Rc::new(map)))
            }
        }
    }

    fn apply_function(
        &mut self,
        function: Value,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        match function {
            Value::Function(func) => {
                if args.len() != func.params.len() {
                    return Err(RuntimeError::WrongArgumentCount {
                        want: func.params.len(),
                        got: args.len(),
                    });
                }
                let call_env = Environment::new_enclosed(Rc::clone(&func.env));
                for (param, arg) in func.params.iter().zip(args) {
                    call_env.set(param.clone(), arg);
                }
                let result = self.eval_block(&func.body, &call_env)?;
                match self.is_returning.take() {
                    Some(value) => Ok(value),
                    None => Ok(result.unwrap_or(Value::Null)),
                }
            }
            Value::Builtin(builtin) => builtin.apply(&args, self.output),
            other => Err(RuntimeError::NotAFunction(other.type_name())),
        }
    }
}

/// The condition test used by `if`: exactly `true` is truthy.  `false`,
/// `null`, and every other value (including integers) are not.
fn is_truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn eval_prefix(op: PrefixOp, right: Value) -> Result<Value, RuntimeError> {
    match op {
        PrefixOp::Bang => Ok(Value::Bool(matches!(
            right,
            Value::Bool(false) | Value::Null
        ))),
        PrefixOp::Minus => match right {
            Value::Integer(value) => Ok(Value::Integer(value.wrapping_neg())),
            other => Err(RuntimeError::UnknownPrefixOperator {
                op,
                right: other.type_name(),
            }),
        },
    }
}

fn eval_infix(op: InfixOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    if let (Value::Integer(l), Value::Integer(r)) = (&left, &right) {
        return eval_integer_infix(op, *l, *r);
    }
    match op {
        InfixOp::Eq => return Ok(Value::Bool(left == right)),
        InfixOp::NotEq => return Ok(Value::Bool(left != right)),
        _ => {}
    }
    if left.type_name() != right.type_name() {
        return Err(RuntimeError::TypeMismatch {
            left: left.type_name(),
            op,
            right: right.type_name(),
        });
    }
    if let (Value::Str(l), Value::Str(r)) = (&left, &right) {
        if op == InfixOp::Plus {
            return Ok(Value::from_string(format!("{}{}", l, r)));
        }
    }
    Err(RuntimeError::UnknownInfixOperator {
        left: left.type_name(),
        op,
        right: right.type_name(),
    })
}

fn eval_integer_infix(op: InfixOp, left: i64, right: i64) -> Result<Value, RuntimeError> {
    match op {
        InfixOp::Plus => Ok(Value::Integer(left.wrapping_add(right))),
        InfixOp::Minus => Ok(Value::Integer(left.wrapping_sub(right))),
        InfixOp::Asterisk => Ok(Value::Integer(left.wrapping_mul(right))),
        InfixOp::Slash => {
            if right == 0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Integer(left.wrapping_div(right)))
            }
        }
        InfixOp::Lt => Ok(Value::Bool(left < right)),
        InfixOp::Gt => Ok(Value::Bool(left > right)),
        InfixOp::Le => Ok(Value::Bool(left <= right)),
        InfixOp::Ge => Ok(Value::Bool(left >= right)),
        InfixOp::Eq => Ok(Value::Bool(left == right)),
        InfixOp::NotEq => Ok(Value::Bool(left != right)),
    }
}

fn eval_index(left: Value, index: Value) -> Result<Value, RuntimeError> {
    match (&left, &index) {
        (Value::Array(elements), Value::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                Ok(Value::Null)
            } else {
                Ok(elements[*i as usize].clone())
            }
        }
        (Value::Hash(pairs), _) => {
            let key = index
                .hash_key()
                .ok_or_else(|| RuntimeError::UnusableHashKey(index.type_name()))?;
            Ok(pairs.get(&key).cloned().unwrap_or(Value::Null))
        }
        _ => Err(RuntimeError::IndexNotSupported(left.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(input: &str) -> crate::ast::Program {
        let mut parser = Parser::new(Lexer::new(input));
        let program = parser.parse_program();
        assert_eq!(parser.errors(), &[] as &[String], "input: {}", input);
        program
    }

    fn eval_with_output(input: &str, out: &mut Vec<u8>) -> Result<Option<Value>, RuntimeError> {
        let program = parse(input);
        let env = Environment::new();
        Evaluator::new(out).eval_program(&program, &env)
    }

    fn eval_input(input: &str) -> Result<Option<Value>, RuntimeError> {
        let mut out: Vec<u8> = Vec::new();
        eval_with_output(input, &mut out)
    }

    fn eval_value(input: &str) -> Value {
        match eval_input(input) {
            Ok(Some(value)) => value,
            r => panic!("expected a value for {:?}, got {:?}", input, r),
        }
    }

    fn eval_error(input: &str) -> RuntimeError {
        match eval_input(input) {
            Err(e) => e,
            r => panic!("expected an error for {:?}, got {:?}", input, r),
        }
    }

    #[test]
    fn integer_arithmetic() {
        let cases = [
            ("5", 5),
            ("10", 10),
            ("-5", -5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("5 * 2 + 10", 20),
            ("5 + 2 * 10", 25),
            ("5 + 5 * 2", 15),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("7 / 2", 3),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn boolean_expressions() {
        let cases = [
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 < 1", false),
            ("1 > 1", false),
            ("1 <= 1", true),
            ("1 >= 2", false),
            ("2 >= 2", true),
            ("1 == 1", true),
            ("1 != 1", false),
            ("1 == 2", false),
            ("1 != 2", true),
            ("true == true", true),
            ("false == false", true),
            ("true == false", false),
            ("true != false", true),
            ("(1 < 2) == true", true),
            ("(1 < 2) == false", false),
            ("(1 > 2) == true", false),
            ("1 == true", false),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), Value::Bool(expected), "input: {}", input);
        }
    }

    #[test]
    fn bang_operator() {
        let cases = [
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!0", false),
            ("!!true", true),
            ("!!false", false),
            ("!!5", true),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), Value::Bool(expected), "input: {}", input);
        }
    }

    #[test]
    fn if_expressions() {
        let cases = [
            ("if (true) { 10 }", Value::Integer(10)),
            ("if (false) { 10 }", Value::Null),
            ("if (1 < 2) { 10 }", Value::Integer(10)),
            ("if (1 > 2) { 10 }", Value::Null),
            ("if (1 > 2) { 10 } else { 20 }", Value::Integer(20)),
            ("if (1 < 2) { 10 } else { 20 }", Value::Integer(10)),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn integers_are_not_truthy() {
        // Only `true` passes the condition test; even non-zero integers
        // take the else path.
        let cases = [
            ("if (1) { 10 }", Value::Null),
            ("if (0) { 10 }", Value::Null),
            ("if (1) { 10 } else { 20 }", Value::Integer(20)),
            (r#"if ("x") { 10 }"#, Value::Null),
            ("if (first([])) { 10 }", Value::Null),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn return_statements() {
        let cases = [
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("return 2 * 5; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn returns_pierce_nested_blocks() {
        let input = "if (10 > 1) { if (10 > 1) { return 10; } return 1; }";
        assert_eq!(eval_value(input), Value::Integer(10));
    }

    #[test]
    fn error_handling() {
        let cases = [
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            ("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            (r#""Hello" - "World""#, "unknown operator: STRING - STRING"),
            ("5 / 0", "division by zero"),
            ("5(1)", "not a function: INTEGER"),
            (r#"{"name": "Monkey"}[fn(x) { x }];"#, "unusable as hash key: FUNCTION"),
            ("{[1]: 1}", "unusable as hash key: ARRAY"),
            ("5[0]", "index operation not supported: INTEGER"),
            (r#""s"[0]"#, "index operation not supported: STRING"),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_error(input).to_string(), expected, "input: {}", input);
        }
    }

    #[test]
    fn errors_stop_argument_evaluation() {
        let input = "len(foobar, 1)";
        assert_eq!(
            eval_error(input).to_string(),
            "identifier not found: foobar"
        );
    }

    #[test]
    fn let_statements() {
        let cases = [
            ("let a = 5; a;", 5),
            ("let a = 5 * 5; a;", 25),
            ("let a = 5; let b = a; b;", 5),
            ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn trailing_let_produces_no_value() {
        assert_eq!(eval_input("let a = 5;").expect("no error"), None);
        assert_eq!(eval_input("").expect("no error"), None);
    }

    #[test]
    fn function_value_inspect() {
        assert_eq!(
            eval_value("fn(x) { x + 2; };").to_string(),
            "fn(x) { (x + 2) }"
        );
        assert_eq!(eval_value("len").to_string(), "builtin function");
    }

    #[test]
    fn function_application() {
        let cases = [
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
            ("let add = fn(a, b) { a + b }; add(2, 3)", 5),
            ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("fn(x) { x; }(5)", 5),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), Value::Integer(expected), "input: {}", input);
        }
    }

    #[test]
    fn function_body_without_value_yields_null() {
        assert_eq!(eval_value("let f = fn() { let a = 1; }; f()"), Value::Null);
        assert_eq!(eval_value("let f = fn() {}; f()"), Value::Null);
    }

    #[test]
    fn call_arity_is_checked() {
        assert_eq!(
            eval_error("fn(x) { x }();").to_string(),
            "wrong number of arguments: want=1, got=0"
        );
        assert_eq!(
            eval_error("fn() { 1 }(2);").to_string(),
            "wrong number of arguments: want=0, got=1"
        );
    }

    #[test]
    fn closures() {
        let input = "
            let newAdder = fn(x) { fn(y) { x + y } };
            let addTwo = newAdder(2);
            addTwo(3);";
        assert_eq!(eval_value(input), Value::Integer(5));
    }

    #[test]
    fn closures_observe_later_rebindings() {
        // `let` rebinds in the same frame, and the function captured the
        // frame itself, not a snapshot.
        let input = "let x = 1; let f = fn() { x }; let x = 2; f()";
        assert_eq!(eval_value(input), Value::Integer(2));
    }

    #[test]
    fn recursion() {
        let input = "
            let fact = fn(n) { if (n == 0) { return 1; } return n * fact(n - 1); };
            fact(5)";
        assert_eq!(eval_value(input), Value::Integer(120));
    }

    #[test]
    fn string_literals_and_concatenation() {
        assert_eq!(eval_value(r#""Hello World!""#).to_string(), "Hello World!");
        assert_eq!(
            eval_value(r#""Hello" + " " + "World!""#).to_string(),
            "Hello World!"
        );
    }

    #[test]
    fn string_equality_is_structural() {
        assert_eq!(eval_value(r#""a" == "a""#), Value::Bool(true));
        assert_eq!(eval_value(r#""a" != "b""#), Value::Bool(true));
        assert_eq!(eval_value(r#""a" == "b""#), Value::Bool(false));
    }

    #[test]
    fn array_literals() {
        assert_eq!(eval_value("[1, 2 * 2, 3 + 3]").to_string(), "[1, 4, 6]");
        assert_eq!(eval_value("[]").to_string(), "[]");
    }

    #[test]
    fn array_index_expressions() {
        let cases = [
            ("[1, 2, 3][0]", Value::Integer(1)),
            ("[1, 2, 3][1]", Value::Integer(2)),
            ("[1, 2, 3][2]", Value::Integer(3)),
            ("let i = 0; [1][i];", Value::Integer(1)),
            ("[1, 2, 3][1 + 1];", Value::Integer(3)),
            ("let myArray = [1, 2, 3]; myArray[2];", Value::Integer(3)),
            (
                "let myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];",
                Value::Integer(6),
            ),
            ("[1, 2, 3][3]", Value::Null),
            ("[1, 2, 3][-1]", Value::Null),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn hash_literals_and_lookups() {
        let input = r#"
            let two = "two";
            let h = {"one": 10 - 9, two: 1 + 1, "thr" + "ee": 6 / 2, 4: 4, true: 5, false: 6};
            h["one"] + h["two"] + h["three"] + h[4] + h[true] + h[false]"#;
        assert_eq!(eval_value(input), Value::Integer(21));
    }

    #[test]
    fn hash_index_expressions() {
        let cases = [
            (r#"{"foo": 5}["foo"]"#, Value::Integer(5)),
            (r#"{"foo": 5}["bar"]"#, Value::Null),
            (r#"{"a": 1}["b"]"#, Value::Null),
            (r#"let key = "foo"; {"foo": 5}[key]"#, Value::Integer(5)),
            (r#"{}["foo"]"#, Value::Null),
            ("{5: 5}[5]", Value::Integer(5)),
            ("{true: 5}[true]", Value::Integer(5)),
            ("{false: 5}[false]", Value::Integer(5)),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn duplicate_hash_keys_keep_the_last_value() {
        assert_eq!(eval_value(r#"{"a": 1, "a": 2}["a"]"#), Value::Integer(2));
    }

    #[test]
    fn builtins_through_source() {
        let cases = [
            (r#"len("hello")"#, Value::Integer(5)),
            (r#"len("")"#, Value::Integer(0)),
            ("len([1, 2, 3])", Value::Integer(3)),
            ("first([1, 2, 3])", Value::Integer(1)),
            ("last([1, 2, 3])", Value::Integer(3)),
            ("first([])", Value::Null),
        ];
        for (input, expected) in cases {
            assert_eq!(eval_value(input), expected, "input: {}", input);
        }
        assert_eq!(eval_value("rest([1, 2, 3])").to_string(), "[2, 3]");
        assert_eq!(
            eval_value("let a = [1]; push(a, 2); a").to_string(),
            "[1]"
        );
        assert_eq!(eval_value("push([1], 2)").to_string(), "[1, 2]");
    }

    #[test]
    fn builtin_errors_through_source() {
        assert_eq!(
            eval_error("len(1)").to_string(),
            "argument to `len` not supported, got INTEGER"
        );
        assert_eq!(
            eval_error(r#"len("one", "two")"#).to_string(),
            "wrong number of arguments: want=1, got=2"
        );
    }

    #[test]
    fn puts_writes_to_the_output_sink() {
        let mut out: Vec<u8> = Vec::new();
        let result = eval_with_output(r#"puts("hello"); puts(1, 2)"#, &mut out)
            .expect("no error");
        assert_eq!(result, Some(Value::Null));
        assert_eq!(String::from_utf8(out).expect("utf8 output"), "hello\n1\n2\n");
    }

    #[test]
    fn a_failed_evaluation_does_not_leak_a_pending_return() {
        // The if-expression parks a return, then the right operand fails;
        // the next run through the same evaluator must not see the parked
        // value.
        let mut out: Vec<u8> = Vec::new();
        let env = Environment::new();
        let mut evaluator = Evaluator::new(&mut out);
        let poisoned = parse("(if (true) { return 1; }) + foobar");
        assert!(evaluator.eval_program(&poisoned, &env).is_err());
        let next = parse("5");
        match evaluator.eval_program(&next, &env) {
            Ok(Some(Value::Integer(5))) => (),
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn higher_order_functions() {
        let input = "
            let map = fn(arr, f) {
                let iter = fn(arr, accumulated) {
                    if (len(arr) == 0) {
                        accumulated
                    } else {
                        iter(rest(arr), push(accumulated, f(first(arr))));
                    }
                };
                iter(arr, []);
            };
            map([1, 2, 3], fn(x) { x * 2 })";
        assert_eq!(eval_value(input).to_string(), "[2, 4, 6]");
    }
}
