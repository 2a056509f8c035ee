use std::fmt;

/// An ordered sequence of top-level statements; the root of every parse.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Let { name: String, value: Expr },
    Return(Expr),
    Expression(Expr),
}

/// A braced statement list.  Only ever a child of `if` expressions and
/// function literals, never a top-level statement.
#[derive(Debug, PartialEq, Clone)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Ident(String),
    Int(i64),
    Bool(bool),
    Str(String),
    Prefix {
        op: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: BlockStmt,
        alternative: Option<BlockStmt>,
    },
    Function {
        params: Vec<String>,
        body: BlockStmt,
    },
    Call {
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    Array(Vec<Expr>),
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    /// Key/value pairs in source order.
    Hash(Vec<(Expr, Expr)>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOp {
    Bang,
    Minus,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOp {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    NotEq,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Bang => write!(f, "!"),
            PrefixOp::Minus => write!(f, "-"),
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfixOp::Plus => write!(f, "+"),
            InfixOp::Minus => write!(f, "-"),
            InfixOp::Asterisk => write!(f, "*"),
            InfixOp::Slash => write!(f, "/"),
            InfixOp::Lt => write!(f, "<"),
            InfixOp::Gt => write!(f, ">"),
            InfixOp::Le => write!(f, "<="),
            InfixOp::Ge => write!(f, ">="),
            InfixOp::Eq => write!(f, "=="),
            InfixOp::NotEq => write!(f, "!="),
        }
    }
}

// The Display impls below are the parser's pretty-print: prefix and infix
// expressions come out fully parenthesized, so operator precedence is
// visible in the output and the text re-parses to the same tree.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {};", name, value),
            Stmt::Return(value) => write!(f, "return {};", value),
            Stmt::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for BlockStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Int(value) => write!(f, "{}", value),
            Expr::Bool(value) => write!(f, "{}", value),
            Expr::Str(text) => write!(f, "{}", text),
            Expr::Prefix { op, right } => write!(f, "({}{})", op, right),
            Expr::Infix { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if{} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::Function { params, body } => {
                write!(f, "fn({}) {}", params.join(", "), body)
            }
            Expr::Call { function, args } => {
                let args = args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
                write!(f, "{}({})", function, args.join(", "))
            }
            Expr::Array(elements) => {
                let elements = elements.iter().map(|e| e.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", elements.join(", "))
            }
            Expr::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expr::Hash(pairs) => {
                let pairs = pairs
                    .iter()
                    .map(|(k, v)| format!("{}:{}", k, v))
                    .collect::<Vec<_>>();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}
