//! Display and Debug implementations for Value

use std::fmt;

use super::*;

fn write_items<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{:?}", item)?;
    }
    Ok(())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "NOTHING"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Node(node) => write!(f, "{:?}", node),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Integer(n) => write!(f, "{}", n.0),
            Node::Float(n) => write!(f, "{:?}", n.0),
            Node::Text(t) => write!(f, "{:?}", t.as_str()),
            Node::Binary(b) => write!(f, "<binary {}>", b.to_hex()),

            Node::Sequence(s) => {
                write!(f, "[")?;
                write_items(f, s.iter())?;
                write!(f, "]")
            }

            Node::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {:?}", k, v)?;
                }
                write!(f, "}}")
            }

            Node::Closure(c) => write!(f, "<closure {}>", c.name),
            Node::Object(o) => write!(f, "<{} object>", o.class_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display drops the quotes around text and the marker for absence
        match self {
            Value::Nothing => Ok(()),
            Value::Float(n) => write!(f, "{}", n),
            Value::Node(Node::Float(n)) => write!(f, "{}", n.0),
            Value::Node(Node::Text(t)) => write!(f, "{}", t.as_str()),
            _ => fmt::Debug::fmt(self, f),
        }
    }
}
