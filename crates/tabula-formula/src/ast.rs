use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at token {position})")]
pub struct ParseError {
    pub message: String,
    /// Index of the offending token.
    pub position: usize,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Range,
    Pow,
    Mul,
    Div,
    Add,
    Sub,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    pub fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            ":" => BinaryOp::Range,
            "^" => BinaryOp::Pow,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "&" => BinaryOp::Concat,
            "=" => BinaryOp::Eq,
            "<>" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Range => ":",
            BinaryOp::Pow => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => 1,
            BinaryOp::Concat => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div => 4,
            BinaryOp::Pow => 5,
            BinaryOp::Range => 8,
        }
    }
}

pub(crate) const UNARY_PRECEDENCE: u8 = 6;
pub(crate) const POSTFIX_PRECEDENCE: u8 = 7;

#[derive(Clone, Debug, PartialEq)]
pub enum Ast {
    /// Source text of the literal.
    Number(String),
    /// Unquoted, unescaped string content.
    String(String),
    Boolean(bool),
    Error(String),
    Reference(String),
    TableReference(String),
    /// Named range or other bare identifier.
    Symbol(String),
    FunctionCall {
        name: String,
        args: Vec<Ast>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Ast>,
    },
    /// Postfix `%`.
    Percent(Box<Ast>),
    Binary {
        op: BinaryOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    /// Omitted function argument (`IF(A1,,2)`).
    Empty,
}

impl Ast {
    fn precedence(&self) -> u8 {
        match self {
            Ast::Binary { op, .. } => op.precedence(),
            Ast::Unary { .. } => UNARY_PRECEDENCE,
            Ast::Percent(_) => POSTFIX_PRECEDENCE,
            _ => u8::MAX,
        }
    }

    /// Visit every node, parents before children.
    pub fn walk(&self, visit: &mut dyn FnMut(&Ast)) {
        visit(self);
        match self {
            Ast::FunctionCall { args, .. } => args.iter().for_each(|a| a.walk(visit)),
            Ast::Unary { operand, .. } | Ast::Percent(operand) => operand.walk(visit),
            Ast::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            _ => {}
        }
    }
}

fn quote_string(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn wrap(ast: &Ast, parens: bool) -> String {
    let text = ast_to_formula(ast);
    if parens {
        format!("({text})")
    } else {
        text
    }
}

/// Serialize an AST back to formula text (without the leading `=`), adding parentheses only
/// where precedence requires them.
pub fn ast_to_formula(ast: &Ast) -> String {
    match ast {
        Ast::Number(n) => n.clone(),
        Ast::String(s) => quote_string(s),
        Ast::Boolean(true) => "TRUE".to_string(),
        Ast::Boolean(false) => "FALSE".to_string(),
        Ast::Error(e) => e.clone(),
        Ast::Reference(r) | Ast::TableReference(r) | Ast::Symbol(r) => r.clone(),
        Ast::Empty => String::new(),
        Ast::FunctionCall { name, args } => {
            let args: Vec<String> = args.iter().map(ast_to_formula).collect();
            format!("{name}({})", args.join(","))
        }
        Ast::Unary { op, operand } => {
            let sign = match op {
                UnaryOp::Plus => "+",
                UnaryOp::Minus => "-",
            };
            format!("{sign}{}", wrap(operand, operand.precedence() < UNARY_PRECEDENCE))
        }
        Ast::Percent(operand) => {
            format!("{}%", wrap(operand, operand.precedence() < POSTFIX_PRECEDENCE))
        }
        Ast::Binary { op, left, right } => {
            let prec = op.precedence();
            format!(
                "{}{}{}",
                wrap(left, left.precedence() < prec),
                op.as_str(),
                wrap(right, right.precedence() <= prec)
            )
        }
    }
}
