use gll_core::{Grammar, ResultView};

fn main() {
    let mut g = Grammar::new();

    // r = "a" | "a" r, a recursive grammar matching runs of "a". Every
    // consumed prefix is its own derivation, so parsing is ambiguous.
    let a = g.literal("a");
    let r = g.alternately(a, a);
    let step = g.followed_by(a, r);
    g.set_next(r, step).unwrap();

    let input = "aaaa";
    println!("Input: {:?}\n", input);

    let parsed = g.parse(r, input);
    for view in g.views(&parsed) {
        match view {
            ResultView::Success { value, rest } => {
                println!("Success: consumed {} (rest {:?})", value.leaves().len(), rest);
            }
            ResultView::Failure { reason, rest } => {
                println!("Failure: {} (rest {:?})", reason, rest);
            }
        }
    }
}
