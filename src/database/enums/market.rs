use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Market a catalog symbol is listed on
///
/// Together with the symbol code this forms the unique key of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Market {
    /// Taiwan Stock Exchange / TPEx listings
    #[serde(rename = "TW")]
    Taiwan,

    /// US listings
    #[serde(rename = "US")]
    UnitedStates,
}

impl Market {
    /// Convert enum to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Taiwan => "TW",
            Market::UnitedStates => "US",
        }
    }

    /// Parse the database / config code
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TW" => Some(Market::Taiwan),
            "US" => Some(Market::UnitedStates),
            _ => None,
        }
    }

    /// Markets synced by the catalog job, in sync order
    pub fn all() -> Vec<Self> {
        vec![Market::Taiwan, Market::UnitedStates]
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql<Text, Pg> for Market {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for Market {
    fn from_sql(bytes: <Pg as diesel::backend::Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Market::from_code(&text).ok_or_else(|| format!("Invalid market value: {}", text).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_codes() {
        assert_eq!(Market::Taiwan.as_str(), "TW");
        assert_eq!(Market::UnitedStates.as_str(), "US");
        assert_eq!(Market::from_code("tw"), Some(Market::Taiwan));
        assert_eq!(Market::from_code(" US "), Some(Market::UnitedStates));
        assert_eq!(Market::from_code("JP"), None);
    }

    #[test]
    fn test_market_serde_uses_codes() {
        let json = serde_json::to_string(&Market::Taiwan).unwrap();
        assert_eq!(json, "\"TW\"");

        let market: Market = serde_json::from_str("\"US\"").unwrap();
        assert_eq!(market, Market::UnitedStates);
    }
}
