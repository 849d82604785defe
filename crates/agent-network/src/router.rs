//! Keyword intent router
//!
//! A fixed decision table of `(route, keywords)` rows checked in order. The first
//! row with a keyword contained in the message wins; no match falls through to
//! general chat.

use medinote_common::{ConversationState, RouteName};

const HISTORY_KEYWORDS: &[&str] = &[
    "지난번",
    "예전에",
    "이전 대화",
    "지난 대화",
    "전에 했던",
    "예전에 뭐라고",
    "지난 기록",
    "예전에 뭐라고 했었지",
    "물어봤었지",
    "이전 질문",
    "이전 답변",
    "last time",
    "previously asked",
    "earlier conversation",
];

const RECORD_KEYWORDS: &[&str] = &[
    "진료 기록",
    "진료기록",
    "진료 내역",
    "진료내역",
    "처방전",
    "내 처방",
    "지난 처방",
    "검사 결과",
    "검사결과",
    "입원 기록",
    "입원기록",
    "나의 기록",
    "내 기록",
    "나의 진료",
    "개인 기록",
    "병원 다녀온",
    "의무기록",
    "건강 분석",
    "건강분석",
    "건강 상태",
    "건강상태",
    "내 건강",
    "나의 건강",
    "건강 정보",
    "건강정보",
    "프로필",
    "내 프로필",
    "건강 프로필",
    "bmi",
    "체질량",
    "키",
    "몸무게",
    "음주",
    "흡연",
    "약 정보",
    "질환 정보",
    "알러지",
    "my record",
    "my prescription",
    "medical record",
];

const DRUG_KEYWORDS: &[&str] = &[
    "약",
    "약을",
    "약이",
    "약은",
    "정(",
    "캡슐",
    "시럽",
    "복용",
    "복용법",
    "복용해도",
    "먹어도",
    "먹으면",
    "영양제",
    "비타민",
    "건강기능식품",
    "건기식",
    "상호작용",
    "같이 먹어도",
    "병용",
    "같이 먹으면",
    "충돌",
    "부작용",
    "반응이",
    "알약",
    "약국",
    "처방약",
    "의약품",
    "medication",
    "medicine",
    "side effect",
    "supplement",
];

const DISEASE_KEYWORDS: &[&str] = &[
    "증상",
    "아픈",
    "아파요",
    "통증",
    "두통",
    "복통",
    "메스꺼움",
    "구토",
    "설사",
    "변비",
    "열이",
    "발열",
    "발진",
    "기침",
    "가래",
    "호흡곤란",
    "숨쉬기",
    "호흡",
    "진료과",
    "어느 과",
    "어떤 과",
    "검사해야",
    "검사를 받아야",
    "질병",
    "병명",
    "병인가요",
    "symptom",
    "headache",
    "fever",
];

const WEB_KEYWORDS: &[&str] = &[
    "최신",
    "최근",
    "요즘",
    "업데이트",
    "새로 나온",
    "신약",
    "리콜",
    "뉴스",
    "2023",
    "2024",
    "2025",
    "2026",
    "2027",
    "최근 연구",
    "최근 발표",
    "latest",
    "news",
    "recall",
];

/// Ordered decision table. Row order is the routing priority.
pub const DECISION_TABLE: &[(RouteName, &[&str])] = &[
    (RouteName::History, HISTORY_KEYWORDS),
    (RouteName::Db, RECORD_KEYWORDS),
    (RouteName::Drug, DRUG_KEYWORDS),
    (RouteName::Disease, DISEASE_KEYWORDS),
    (RouteName::Web, WEB_KEYWORDS),
];

/// Primary route for a message. Matching is case-insensitive substring containment.
pub fn route_text(text: &str) -> RouteName {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return RouteName::Chit;
    }

    DECISION_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(route, _)| *route)
        .unwrap_or(RouteName::Chit)
}

/// Primary route for the latest message of a turn
pub fn route(state: &ConversationState) -> RouteName {
    route_text(state.last_message_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_stored_lowercase() {
        for (route, keywords) in DECISION_TABLE {
            for keyword in *keywords {
                assert_eq!(*keyword, keyword.to_lowercase(), "{route} keyword {keyword}");
            }
        }
    }

    #[test]
    fn test_table_covers_every_non_default_route_once() {
        let routes: Vec<_> = DECISION_TABLE.iter().map(|(r, _)| *r).collect();
        assert_eq!(
            routes,
            vec![RouteName::History, RouteName::Db, RouteName::Drug, RouteName::Disease, RouteName::Web]
        );
    }

    #[test]
    fn test_blank_message_is_chit() {
        assert_eq!(route_text(""), RouteName::Chit);
        assert_eq!(route_text("   \n"), RouteName::Chit);
        assert_eq!(route(&ConversationState::default()), RouteName::Chit);
    }

    #[test]
    fn test_uppercase_keywords_match() {
        assert_eq!(route_text("제 BMI 알려줘"), RouteName::Db);
        assert_eq!(route_text("Any NEWS about this?"), RouteName::Web);
    }
}
