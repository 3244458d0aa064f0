#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;
    use crate::error::{CastError, Error, ErrorCode};
    use crate::models::*;
    use crate::tally::{participation_percent, position_results, tally_from_votes};
    use crate::validation::*;

    fn position(name: &str) -> Position {
        Position {
            id: PositionId::generate(),
            name: name.into(),
            is_open: true,
            opens_at: None,
            closes_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn candidate(position: &Position, name: &str) -> Candidate {
        Candidate { id: CandidateId::generate(), position_id: position.id, name: name.into() }
    }

    fn vote(voter: VoterId, position: &Position, candidate: &Candidate) -> VoteRecord {
        VoteRecord {
            id: Uuid::new_v4(),
            voter_id: voter,
            position_id: position.id,
            candidate_id: candidate.id,
            cast_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_participation_rounding() {
        assert_eq!(participation_percent(0, 0), 0);
        assert_eq!(participation_percent(1, 3), 33);
        assert_eq!(participation_percent(2, 3), 67);
        assert_eq!(participation_percent(1, 2), 50);
        assert_eq!(participation_percent(3, 3), 100);
        assert_eq!(participation_percent(0, 7), 0);
    }

    #[test]
    fn test_participation_never_exceeds_cohort() {
        assert_eq!(participation_percent(5, 3), 100);
        assert_eq!(Participation::new(0, 0).percent, 0);
    }

    #[test]
    fn test_tally_from_votes() {
        let president = position("President");
        let (c1, c2) = (candidate(&president, "Ada"), candidate(&president, "Grace"));
        let votes = [
            vote(VoterId::generate(), &president, &c1),
            vote(VoterId::generate(), &president, &c1),
            vote(VoterId::generate(), &president, &c2),
        ];
        let tally = Tally { position_id: president.id, entries: tally_from_votes(&votes) };
        assert_eq!(tally.count_for(c1.id), 2);
        assert_eq!(tally.count_for(c2.id), 1);
        assert_eq!(tally.count_for(CandidateId::generate()), 0);
        assert_eq!(tally.total_votes(), 3);
        assert!(tally_from_votes(Vec::<VoteRecord>::new().iter()).is_empty());
    }

    #[test]
    fn test_results_backfill_and_order() {
        let president = position("President");
        let zed = candidate(&president, "Zed");
        let amy = candidate(&president, "Amy");
        let bob = candidate(&president, "Bob");
        let tally = [TallyEntry { candidate_id: zed.id, votes: 3 }, TallyEntry { candidate_id: bob.id, votes: 1 }];

        let results = position_results(&president, &[amy.clone(), bob.clone(), zed.clone()], &tally);
        let names: Vec<_> = results.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Zed", "Bob", "Amy"]);
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.candidates[0].share_percent, 75);
        assert_eq!(results.candidates[2].votes, 0);
        assert_eq!(results.leader, Some(zed.id));
    }

    #[test]
    fn test_results_tie_has_no_leader() {
        let president = position("President");
        let (a, b) = (candidate(&president, "A"), candidate(&president, "B"));
        let tally = [TallyEntry { candidate_id: a.id, votes: 2 }, TallyEntry { candidate_id: b.id, votes: 2 }];
        let results = position_results(&president, &[a.clone(), b.clone()], &tally);
        assert_eq!(results.leader, None);
        let names: Vec<_> = results.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);

        let empty = position_results(&president, &[a, b], &[]);
        assert_eq!(empty.leader, None);
        assert_eq!(empty.total_votes, 0);
        assert!(empty.candidates.iter().all(|c| c.share_percent == 0));
    }

    #[test]
    fn test_results_ignore_foreign_rows() {
        let president = position("President");
        let treasurer = position("Treasurer");
        let a = candidate(&president, "A");
        let stray = candidate(&treasurer, "Stray");
        let tally = [TallyEntry { candidate_id: a.id, votes: 1 }, TallyEntry { candidate_id: stray.id, votes: 9 }];
        let results = position_results(&president, &[a.clone(), stray], &tally);
        assert_eq!(results.candidates.len(), 1);
        assert_eq!(results.total_votes, 1);
        assert_eq!(results.leader, Some(a.id));
    }

    #[test]
    fn test_position_window() {
        let now = OffsetDateTime::now_utc();
        let mut p = position("Secretary");
        assert!(p.is_accepting_votes(now));

        p.opens_at = Some(now + Duration::hours(1));
        assert!(!p.is_accepting_votes(now));

        p.opens_at = Some(now - Duration::hours(1));
        p.closes_at = Some(now);
        assert!(!p.is_accepting_votes(now), "window end is exclusive");

        p.closes_at = Some(now + Duration::minutes(1));
        assert!(p.is_accepting_votes(now));

        p.is_open = false;
        assert!(!p.is_accepting_votes(now));
    }

    #[test]
    fn test_cast_request_validation() {
        let (v, p, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let request = CastVoteRequest {
            voter_id: v.to_string(),
            position_id: format!(" {p} "),
            candidate_id: c.to_string(),
        };
        let cast = validate_cast_request(&request).unwrap();
        assert_eq!(cast.voter_id, VoterId(v));
        assert_eq!(cast.position_id, PositionId(p));
        assert_eq!(cast.candidate_id, CandidateId(c));

        let missing = CastVoteRequest { candidate_id: String::new(), ..request.clone() };
        assert_eq!(validate_cast_request(&missing), Err(ValidationError::MissingField("candidateId")));

        let garbage = CastVoteRequest { voter_id: "student-42".into(), ..request };
        assert!(matches!(
            validate_cast_request(&garbage),
            Err(ValidationError::InvalidId { field: "voterId", .. })
        ));
    }

    #[test]
    fn test_cast_request_accepts_missing_json_fields() {
        let request: CastVoteRequest = serde_json::from_str(r#"{"voterId":"x"}"#).unwrap();
        assert_eq!(validate_cast_request(&request), Err(ValidationError::InvalidId { field: "voterId", value: "x".into() }));
    }

    #[test]
    fn test_admin_request_validation() {
        let now = OffsetDateTime::now_utc();
        let ok = CreatePositionRequest { name: "President".into(), is_open: true, opens_at: Some(now), closes_at: Some(now + Duration::days(1)) };
        assert!(validate_position_request(&ok).is_ok());

        let inverted = CreatePositionRequest { closes_at: Some(now - Duration::days(1)), ..ok.clone() };
        assert_eq!(validate_position_request(&inverted), Err(ValidationError::InvalidWindow));

        let blank = CreatePositionRequest { name: "   ".into(), ..ok };
        assert_eq!(validate_position_request(&blank), Err(ValidationError::EmptyName));

        let long = CreateCandidateRequest { name: "x".repeat(MAX_NAME_LENGTH + 1) };
        assert_eq!(validate_candidate_request(&long), Err(ValidationError::NameTooLong));

        let voter = RegisterVoterRequest { department: "".into(), eligible: true };
        assert_eq!(validate_voter_request(&voter), Err(ValidationError::EmptyDepartment));
    }

    #[test]
    fn test_parse_cohort() {
        let id = Uuid::new_v4().to_string();
        let cohort = parse_cohort(&[id.clone(), id.clone()]).unwrap();
        assert_eq!(cohort.len(), 1);
        assert!(parse_cohort(&[]).unwrap().is_empty());
        assert!(parse_cohort(&["nope".into()]).is_err());
    }

    #[test]
    fn test_cast_error_classification() {
        assert!(CastError::Persistence("connection reset".into()).is_retryable());
        for terminal in [
            CastError::VotingClosed,
            CastError::PositionUnavailable,
            CastError::CandidateMismatch,
            CastError::VoterNotEligible,
            CastError::DuplicateVote,
        ] {
            assert!(!terminal.is_retryable(), "{terminal} must not be retried");
        }
        assert_eq!(CastError::DuplicateVote.code(), ErrorCode::Conflict);

        let body = Error::from(&CastError::Persistence("password=hunter2".into()));
        assert!(body.retryable);
        assert!(!body.message.contains("hunter2"));
    }

    #[test]
    fn test_change_event_wire_format() {
        let id = PositionId::generate();
        let json = serde_json::to_value(ChangeEvent::TallyChanged { position_id: id }).unwrap();
        assert_eq!(json["type"], "tallyChanged");
        assert_eq!(json["positionId"], id.to_string());
        let reset = serde_json::to_value(ChangeEvent::LedgerReset).unwrap();
        assert_eq!(reset["type"], "ledgerReset");
    }

    #[test]
    fn test_timestamps_share_one_wire_format() {
        let mut president = position("President");
        president.opens_at = Some(president.created_at - Duration::hours(1));
        let ada = candidate(&president, "Ada");
        let voter = Voter {
            id: VoterId::generate(),
            department: "Engineering".into(),
            eligible: true,
            registered_at: OffsetDateTime::now_utc(),
        };
        let record = vote(voter.id, &president, &ada);

        let position_json = serde_json::to_value(&president).unwrap();
        let voter_json = serde_json::to_value(&voter).unwrap();
        let record_json = serde_json::to_value(&record).unwrap();
        for stamp in [
            &position_json["opensAt"],
            &position_json["createdAt"],
            &voter_json["registeredAt"],
            &record_json["castAt"],
        ] {
            let text = stamp.as_str().expect("timestamp serialized as a string");
            assert!(OffsetDateTime::parse(text, &time::format_description::well_known::Rfc3339).is_ok());
        }

        let decoded: VoteRecord = serde_json::from_value(record_json).unwrap();
        assert_eq!(decoded, record);
    }
}
