use anyhow::Context;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use threadkit_client::{
    api::{Comment, CommentId, Reaction, User},
    build_tree,
};

const REACTIONS: [(&str, &str, &str); 4] = [
    ("like", "Like", "👍"),
    ("love", "Love", "❤️"),
    ("laugh", "Laugh", "😄"),
    ("dislike", "Dislike", "👎"),
];

const MAX_WORDS: usize = 40;
const MAX_REACTION_COUNT: u32 = 25;

/// Prints a random comment thread as JSON, for seeding demos and adapters
#[derive(structopt::StructOpt)]
struct Opt {
    /// Number of comments to generate
    #[structopt(short, long, default_value = "50")]
    comments: usize,

    /// Number of distinct authors
    #[structopt(short, long, default_value = "5")]
    users: usize,

    /// Probability for each comment to be a reply rather than a root
    #[structopt(long, default_value = "0.6")]
    reply_ratio: f64,

    /// Seed for reproducible output
    #[structopt(long)]
    seed: Option<u64>,

    /// Print a flat list linked by `parent_id` instead of a nested tree
    #[structopt(long)]
    flat: bool,
}

fn gen_users(rng: &mut StdRng, n: usize) -> Vec<User> {
    (0..n.max(1))
        .map(|i| {
            let mut u = User::new(format!("user-{i}"), lipsum::lipsum_title());
            u.is_verified = rng.gen_bool(0.2);
            u
        })
        .collect()
}

fn gen_reactions(rng: &mut StdRng) -> Vec<Reaction> {
    let mut res = Vec::new();
    for (id, label, emoji) in REACTIONS {
        if !rng.gen_bool(0.5) {
            continue;
        }
        let count = rng.gen_range(0..=MAX_REACTION_COUNT);
        let is_active = count > 0 && rng.gen_bool(0.1);
        res.push(Reaction::new(id, label, emoji).with_count(count, is_active));
    }
    res
}

/// Comments in creation order, each reply pointing at an earlier comment
fn gen_comments(
    rng: &mut StdRng,
    users: &[User],
    n: usize,
    reply_ratio: f64,
) -> anyhow::Result<Vec<Comment>> {
    let mut created_at = chrono::Utc::now() - chrono::Duration::days(30);
    let mut comments: Vec<Comment> = Vec::with_capacity(n);
    for i in 0..n {
        let author = users.choose(&mut *rng).cloned().context("no users")?;
        let words = rng.gen_range(1..=MAX_WORDS);
        created_at += chrono::Duration::minutes(rng.gen_range(1..=90));
        let mut c = Comment::new(
            CommentId::new(format!("c{i}")),
            author,
            lipsum::lipsum_with_rng(&mut *rng, words),
            created_at,
        )
        .with_reactions(gen_reactions(rng));
        if !comments.is_empty() && rng.gen_bool(reply_ratio) {
            c.parent_id = comments.choose(&mut *rng).map(|p| p.id.clone());
        }
        if rng.gen_bool(0.1) {
            c.is_edited = true;
            c.updated_at = Some(created_at + chrono::Duration::minutes(5));
        }
        comments.push(c);
    }
    Ok(comments)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let opt = <Opt as structopt::StructOpt>::from_args();
    anyhow::ensure!(
        (0.0..=1.0).contains(&opt.reply_ratio),
        "reply ratio must be between 0 and 1, got {}",
        opt.reply_ratio
    );

    let mut rng = match opt.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let users = gen_users(&mut rng, opt.users);
    let comments = gen_comments(&mut rng, &users, opt.comments, opt.reply_ratio)?;

    let json = match opt.flat {
        true => serde_json::to_string_pretty(&comments),
        false => serde_json::to_string_pretty(&build_tree(comments)),
    }
    .context("serializing comments")?;
    tracing::info!(num_comments = opt.comments, num_users = users.len(), "generated comments");
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use threadkit_client::flatten;

    use super::*;

    fn generate(seed: u64, n: usize, reply_ratio: f64) -> Vec<Comment> {
        let mut rng = StdRng::seed_from_u64(seed);
        let users = gen_users(&mut rng, 3);
        gen_comments(&mut rng, &users, n, reply_ratio).expect("generating comments")
    }

    #[test]
    fn reactions_are_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            for r in gen_reactions(&mut rng) {
                assert!(r.count <= MAX_REACTION_COUNT);
                assert!(!r.is_active || r.count > 0, "{r:?}");
            }
        }
    }

    #[test]
    fn replies_point_at_earlier_comments() {
        let comments = generate(42, 100, 0.8);
        assert_eq!(comments.len(), 100);
        assert!(comments[0].parent_id.is_none());
        for (i, c) in comments.iter().enumerate() {
            assert!(!c.content.is_empty());
            if let Some(p) = &c.parent_id {
                assert!(comments[..i].iter().any(|e| e.id == *p), "{} has no earlier parent", c.id);
            }
        }
        assert_eq!(flatten(&build_tree(comments)).len(), 100);
    }

    #[test]
    fn seed_makes_structure_reproducible() {
        let parents = |cs: Vec<Comment>| cs.into_iter().map(|c| c.parent_id).collect::<Vec<_>>();
        assert_eq!(parents(generate(3, 50, 0.5)), parents(generate(3, 50, 0.5)));
        assert!(generate(3, 30, 0.0).iter().all(|c| c.parent_id.is_none()));
    }
}
