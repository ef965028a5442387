//! Rewrites the generic `?` placeholder into the driver's native placeholder.
//! `?` inside quoted literals or quoted identifiers is left untouched.

use crate::sql::Dialect;
use std::borrow::Cow;

/// Rewrite every generic placeholder in `sql`, numbering them in positional order.
pub fn rewrite(sql: &str, dialect: Dialect) -> Cow<'_, str> {
    if dialect != Dialect::Postgres || !sql.contains('?') {
        return Cow::Borrowed(sql);
    }
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    let mut quote: Option<char> = None;
    for c in sql.chars() {
        match quote {
            Some(q) => {
                // a doubled quote char closes and reopens, which is the same literal
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' => {
                    n += 1;
                    out.push_str(&dialect.placeholder(n));
                }
                _ => out.push(c),
            },
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_numbers_placeholders_in_order() {
        let sql = "update \"users\" set \"name\"=?, \"email\"=? where \"id\"=?";
        assert_eq!(
            rewrite(sql, Dialect::Postgres),
            "update \"users\" set \"name\"=$1, \"email\"=$2 where \"id\"=$3"
        );
    }

    #[test]
    fn mysql_and_sqlite_keep_question_marks() {
        let sql = "select * from `users` where `id`=?";
        assert!(matches!(rewrite(sql, Dialect::MySql), Cow::Borrowed(_)));
        assert_eq!(rewrite(sql, Dialect::Sqlite), sql);
    }

    #[test]
    fn skips_question_marks_inside_literals() {
        let sql = "select * from t where a = 'why?' and b = ? and \"c?\" = ?";
        assert_eq!(
            rewrite(sql, Dialect::Postgres),
            "select * from t where a = 'why?' and b = $1 and \"c?\" = $2"
        );
    }

    #[test]
    fn escaped_quote_stays_inside_literal() {
        let sql = "select 'it''s ?' , ?";
        assert_eq!(rewrite(sql, Dialect::Postgres), "select 'it''s ?' , $1");
    }
}
