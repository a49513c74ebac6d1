use gll_core::{Grammar, ResultView};

fn main() {
    let mut g = Grammar::new();
    let bird = g.literal("bird");
    let word = g.literal("istheword");
    let both = g.followed_by(bird, word);

    for input in ["birdistheword", "birdisthe", "wordisthebird"] {
        println!("Input: {:?}", input);
        let parsed = g.parse(both, input);
        for view in g.views(&parsed) {
            match view {
                ResultView::Success { value, rest } => {
                    println!("  Success: {:?} (rest {:?})", value.leaves(), rest);
                }
                ResultView::Failure { reason, rest } => {
                    println!("  Failure: {} (rest {:?})", reason, rest);
                }
            }
        }
        println!();
    }
}
