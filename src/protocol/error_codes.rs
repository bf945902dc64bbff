//! Server error codes and their symbolic names.

/// Too many connections
pub const ER_CON_COUNT_ERROR: u16 = 1040;
pub const ER_DBACCESS_DENIED_ERROR: u16 = 1044;
pub const ER_ACCESS_DENIED_ERROR: u16 = 1045;
pub const ER_NO_DB_ERROR: u16 = 1046;
pub const ER_BAD_NULL_ERROR: u16 = 1048;
pub const ER_BAD_DB_ERROR: u16 = 1049;
pub const ER_TABLE_EXISTS_ERROR: u16 = 1050;
pub const ER_BAD_TABLE_ERROR: u16 = 1051;
pub const ER_BAD_FIELD_ERROR: u16 = 1054;
pub const ER_DUP_ENTRY: u16 = 1062;
pub const ER_PARSE_ERROR: u16 = 1064;
pub const ER_EMPTY_QUERY: u16 = 1065;
pub const ER_UNKNOWN_ERROR: u16 = 1105;
pub const ER_TABLEACCESS_DENIED_ERROR: u16 = 1142;
pub const ER_NO_SUCH_TABLE: u16 = 1146;
pub const ER_SYNTAX_ERROR: u16 = 1149;
pub const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
pub const ER_WRONG_ARGUMENTS: u16 = 1210;
pub const ER_LOCK_DEADLOCK: u16 = 1213;
pub const ER_NO_REFERENCED_ROW: u16 = 1216;
pub const ER_ROW_IS_REFERENCED: u16 = 1217;
pub const ER_SPECIFIC_ACCESS_DENIED_ERROR: u16 = 1227;
/// Unknown prepared statement handler
pub const ER_UNKNOWN_STMT_HANDLER: u16 = 1243;
pub const ER_OPTION_PREVENTS_STATEMENT: u16 = 1290;
/// The statement cannot be prepared; it must go through the text protocol
pub const ER_UNSUPPORTED_PS: u16 = 1295;
pub const ER_SP_DOES_NOT_EXIST: u16 = 1305;
pub const ER_QUERY_INTERRUPTED: u16 = 1317;
pub const ER_NO_DEFAULT_FOR_FIELD: u16 = 1364;
pub const ER_TRUNCATED_WRONG_VALUE_FOR_FIELD: u16 = 1366;
pub const ER_DATA_TOO_LONG: u16 = 1406;
pub const ER_ROW_IS_REFERENCED_2: u16 = 1451;
pub const ER_NO_REFERENCED_ROW_2: u16 = 1452;
/// `max_prepared_stmt_count` exhausted on the server
pub const ER_MAX_PREPARED_STMT_COUNT_REACHED: u16 = 1461;
pub const ER_DATA_OUT_OF_RANGE: u16 = 1690;
pub const ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION: u16 = 1792;
pub const ER_READ_ONLY_MODE: u16 = 1836;
pub const ER_QUERY_TIMEOUT: u16 = 3024;

const TABLE: &[(u16, &str)] = &[
    (ER_CON_COUNT_ERROR, "ER_CON_COUNT_ERROR"),
    (ER_DBACCESS_DENIED_ERROR, "ER_DBACCESS_DENIED_ERROR"),
    (ER_ACCESS_DENIED_ERROR, "ER_ACCESS_DENIED_ERROR"),
    (ER_NO_DB_ERROR, "ER_NO_DB_ERROR"),
    (ER_BAD_NULL_ERROR, "ER_BAD_NULL_ERROR"),
    (ER_BAD_DB_ERROR, "ER_BAD_DB_ERROR"),
    (ER_TABLE_EXISTS_ERROR, "ER_TABLE_EXISTS_ERROR"),
    (ER_BAD_TABLE_ERROR, "ER_BAD_TABLE_ERROR"),
    (ER_BAD_FIELD_ERROR, "ER_BAD_FIELD_ERROR"),
    (ER_DUP_ENTRY, "ER_DUP_ENTRY"),
    (ER_PARSE_ERROR, "ER_PARSE_ERROR"),
    (ER_EMPTY_QUERY, "ER_EMPTY_QUERY"),
    (ER_UNKNOWN_ERROR, "ER_UNKNOWN_ERROR"),
    (ER_TABLEACCESS_DENIED_ERROR, "ER_TABLEACCESS_DENIED_ERROR"),
    (ER_NO_SUCH_TABLE, "ER_NO_SUCH_TABLE"),
    (ER_SYNTAX_ERROR, "ER_SYNTAX_ERROR"),
    (ER_LOCK_WAIT_TIMEOUT, "ER_LOCK_WAIT_TIMEOUT"),
    (ER_WRONG_ARGUMENTS, "ER_WRONG_ARGUMENTS"),
    (ER_LOCK_DEADLOCK, "ER_LOCK_DEADLOCK"),
    (ER_NO_REFERENCED_ROW, "ER_NO_REFERENCED_ROW"),
    (ER_ROW_IS_REFERENCED, "ER_ROW_IS_REFERENCED"),
    (ER_SPECIFIC_ACCESS_DENIED_ERROR, "ER_SPECIFIC_ACCESS_DENIED_ERROR"),
    (ER_UNKNOWN_STMT_HANDLER, "ER_UNKNOWN_STMT_HANDLER"),
    (ER_OPTION_PREVENTS_STATEMENT, "ER_OPTION_PREVENTS_STATEMENT"),
    (ER_UNSUPPORTED_PS, "ER_UNSUPPORTED_PS"),
    (ER_SP_DOES_NOT_EXIST, "ER_SP_DOES_NOT_EXIST"),
    (ER_QUERY_INTERRUPTED, "ER_QUERY_INTERRUPTED"),
    (ER_NO_DEFAULT_FOR_FIELD, "ER_NO_DEFAULT_FOR_FIELD"),
    (ER_TRUNCATED_WRONG_VALUE_FOR_FIELD, "ER_TRUNCATED_WRONG_VALUE_FOR_FIELD"),
    (ER_DATA_TOO_LONG, "ER_DATA_TOO_LONG"),
    (ER_ROW_IS_REFERENCED_2, "ER_ROW_IS_REFERENCED_2"),
    (ER_NO_REFERENCED_ROW_2, "ER_NO_REFERENCED_ROW_2"),
    (ER_MAX_PREPARED_STMT_COUNT_REACHED, "ER_MAX_PREPARED_STMT_COUNT_REACHED"),
    (ER_DATA_OUT_OF_RANGE, "ER_DATA_OUT_OF_RANGE"),
    (ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION, "ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION"),
    (ER_READ_ONLY_MODE, "ER_READ_ONLY_MODE"),
    (ER_QUERY_TIMEOUT, "ER_QUERY_TIMEOUT"),
];

/// Look up the symbolic name of a server error code.
pub fn name_of(code: u16) -> Option<&'static str> {
    TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Look up the server error code for a symbolic name.
pub fn code_of(name: &str) -> Option<u16> {
    TABLE.iter().find(|(_, n)| *n == name).map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup() {
        assert_eq!(name_of(1461), Some("ER_MAX_PREPARED_STMT_COUNT_REACHED"));
        assert_eq!(name_of(1062), Some("ER_DUP_ENTRY"));
        assert_eq!(name_of(9999), None);
    }

    #[test]
    fn test_table_is_consistent() {
        for (code, name) in TABLE {
            assert_eq!(code_of(name), Some(*code));
            assert_eq!(name_of(*code), Some(*name));
        }
        assert_eq!(code_of("ER_NOT_A_REAL_ERROR"), None);
    }
}
