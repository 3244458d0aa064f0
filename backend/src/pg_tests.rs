// Runs against a live Postgres server named by DATABASE_URL; each test gets a
// fresh database with the migrations applied.
// cargo test -- --ignored
#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use futures::future::join_all;
    use sqlx::PgPool;
    use shared::{CastError, CastVote, Candidate, CreatePositionRequest, Position, Voter};
    use crate::{
        collaborators::{Catalog, Directory, Settings},
        ledger::VoteLedger,
        queries::PgStore,
    };

    struct Election {
        store: PgStore,
        president: Position,
        treasurer: Position,
        ada: Candidate,
        linus: Candidate,
        voter: Voter,
    }

    impl Election {
        fn vote(&self, position: &Position, candidate: &Candidate) -> CastVote {
            CastVote { voter_id: self.voter.id, position_id: position.id, candidate_id: candidate.id }
        }
    }

    async fn election(pool: PgPool) -> Election {
        let store = PgStore::new(pool);
        store.ensure_settings(true).await.unwrap();

        let open = |name: &str| CreatePositionRequest {
            name: name.into(),
            is_open: true,
            opens_at: None,
            closes_at: None,
        };
        let president = store.create_position(&open("President")).await.unwrap();
        let treasurer = store.create_position(&open("Treasurer")).await.unwrap();
        let ada = store.add_candidate(president.id, "Ada").await.unwrap().unwrap();
        let linus = store.add_candidate(treasurer.id, "Linus").await.unwrap().unwrap();
        let voter = store.register_voter("Engineering", true).await.unwrap();

        Election { store, president, treasurer, ada, linus, voter }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_unique_index_arbitrates_concurrent_casts(pool: PgPool) {
        let e = election(pool).await;
        let vote = e.vote(&e.president, &e.ada);

        let results = join_all((0..16).map(|_| e.store.cast_vote(vote))).await;

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results.iter()
            .filter(|r| matches!(r, Err(CastError::DuplicateVote)))
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(duplicates, 15);

        let tally = e.store.tally(e.president.id).await.unwrap();
        assert_eq!(tally.len(), 1);
        assert_eq!(tally[0].votes, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_other_constraint_failures_are_persistence_errors(pool: PgPool) {
        let e = election(pool).await;

        // Candidate from another position trips votes_candidate_position_fkey.
        let crossed = e.store.cast_vote(e.vote(&e.president, &e.linus)).await;
        assert!(matches!(crossed, Err(CastError::Persistence(_))), "{:?}", crossed);

        let stranger = CastVote { voter_id: shared::VoterId::generate(), ..e.vote(&e.president, &e.ada) };
        let unknown = e.store.cast_vote(stranger).await;
        assert!(matches!(unknown, Err(CastError::Persistence(_))), "{:?}", unknown);

        assert!(!e.store.has_voted(e.voter.id, e.president.id).await.unwrap());
        assert!(e.store.cast_vote(e.vote(&e.president, &e.ada)).await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_reset_clears_every_vote(pool: PgPool) {
        let e = election(pool).await;
        e.store.cast_vote(e.vote(&e.president, &e.ada)).await.unwrap();
        e.store.cast_vote(e.vote(&e.treasurer, &e.linus)).await.unwrap();

        let cohort: HashSet<_> = [e.voter.id].into_iter().collect();
        assert_eq!(e.store.voters_in(&cohort).await.unwrap(), 1);
        assert_eq!(e.store.votes_of(e.voter.id).await.unwrap().len(), 2);

        assert_eq!(e.store.reset_all().await.unwrap(), 2);

        assert!(e.store.tally(e.president.id).await.unwrap().is_empty());
        assert!(e.store.tally(e.treasurer.id).await.unwrap().is_empty());
        assert!(e.store.votes_of(e.voter.id).await.unwrap().is_empty());
        assert_eq!(e.store.voters_in(&cohort).await.unwrap(), 0);
        assert!(e.store.cast_vote(e.vote(&e.president, &e.ada)).await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_seeded_settings_survive_restart(pool: PgPool) {
        let store = PgStore::new(pool);
        store.ensure_settings(true).await.unwrap();
        store.ensure_settings(false).await.unwrap();
        assert!(store.is_voting_enabled().await.unwrap());

        store.set_voting_enabled(false).await.unwrap();
        store.ensure_settings(true).await.unwrap();
        assert!(!store.is_voting_enabled().await.unwrap());
    }
}
