pub mod skill_test_dto;
