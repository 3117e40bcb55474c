//! Row reconstruction: cluster positioned tokens into logical table lines.
//!
//! Rendering jitter means two tokens printed on the same table line can
//! report vertical positions a few units apart. Clustering is greedy and
//! order-dependent: tokens are visited in ascending vertical position and
//! join the *first* existing group whose key (the top of its first token)
//! lies within the tolerance. The sort order before clustering is therefore
//! part of the contract — ties on `top` are broken by `x0` so results are
//! reproducible run to run.
//!
//! The tolerance is a fixed absolute value, not proportional to font size;
//! documents with larger variance need a larger configured tolerance.

use super::words::Token;

/// Partition one page's tokens into rows, top-to-bottom.
///
/// Each returned row is sorted by `x0` ascending. Tokens whose tops differ
/// by at most `tolerance` from a row's key share that row; a token further
/// away from every existing key starts a new row.
pub fn cluster_rows(mut tokens: Vec<Token>, tolerance: f64) -> Vec<Vec<Token>> {
    // Deterministic visit order: vertical position, then horizontal.
    tokens.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut groups: Vec<(f64, Vec<Token>)> = Vec::new();

    for token in tokens {
        match groups
            .iter_mut()
            .find(|(key, _)| (token.top - key).abs() <= tolerance)
        {
            Some((_, row)) => row.push(token),
            None => groups.push((token.top, vec![token])),
        }
    }

    // Keys were created in ascending order, so groups are already
    // top-to-bottom; only the in-row order still needs fixing.
    groups
        .into_iter()
        .map(|(_, mut row)| {
            row.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, x0: f64, top: f64) -> Token {
        Token {
            text: text.to_string(),
            x0,
            x1: x0 + 20.0,
            top,
            bottom: top + 10.0,
        }
    }

    #[test]
    fn tokens_within_tolerance_share_a_row() {
        let tokens = vec![tok("000277", 30.0, 324.0), tok("MARIA", 90.0, 329.0)];
        let rows = cluster_rows(tokens, 6.0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn tokens_beyond_tolerance_never_merge() {
        let tokens = vec![tok("000277", 30.0, 324.0), tok("000278", 30.0, 331.0)];
        let rows = cluster_rows(tokens, 6.0);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn rows_come_out_top_to_bottom() {
        let tokens = vec![
            tok("third", 30.0, 350.0),
            tok("first", 30.0, 100.0),
            tok("second", 30.0, 225.0),
        ];
        let rows = cluster_rows(tokens, 6.0);
        let order: Vec<&str> = rows.iter().map(|r| r[0].text.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn tokens_within_a_row_sort_by_x0() {
        let tokens = vec![
            tok("right", 400.0, 100.0),
            tok("left", 30.0, 102.0),
            tok("middle", 200.0, 98.0),
        ];
        let rows = cluster_rows(tokens, 6.0);
        assert_eq!(rows.len(), 1);
        let order: Vec<&str> = rows[0].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(order, vec!["left", "middle", "right"]);
    }

    #[test]
    fn group_key_is_the_first_token_not_a_running_mean() {
        // 100, 105, 110 with tolerance 6: the third token is 10 away from
        // the first group's key even though it is within 6 of the second
        // token, so it starts a new row. Greedy, key-anchored, on purpose.
        let tokens = vec![
            tok("a", 30.0, 100.0),
            tok("b", 60.0, 105.0),
            tok("c", 90.0, 110.0),
        ];
        let rows = cluster_rows(tokens, 6.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1][0].text, "c");
    }

    #[test]
    fn larger_tolerance_merges_jittery_lines() {
        let tokens = vec![tok("a", 30.0, 100.0), tok("b", 60.0, 109.0)];
        assert_eq!(cluster_rows(tokens.clone(), 6.0).len(), 2);
        assert_eq!(cluster_rows(tokens, 10.0).len(), 1);
    }

    #[test]
    fn empty_page_yields_no_rows() {
        assert!(cluster_rows(Vec::new(), 6.0).is_empty());
    }
}
